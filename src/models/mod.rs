//! Data models for MindBridge

pub mod appointment;
pub mod counsellor;
pub mod enums;
pub mod rating;
pub mod settings;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use appointment::Appointment;
pub use counsellor::{CounsellorListing, CounsellorProfile};
pub use enums::{AppointmentStatus, Role, SessionType};
pub use rating::Rating;
pub use settings::{CounsellorSettings, DaySchedule, WorkingHours};
pub use stats::{CounsellorStats, FieldStatus, Measured, SnapshotStatus};
pub use user::User;
