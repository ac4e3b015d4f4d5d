//! Appointment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{AppointmentStatus, SessionType};

/// A booked session between a client and a counsellor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub counsellor_id: String,
    /// Client (youth user) id
    pub user_id: String,
    pub appointment_date: DateTime<Utc>,
    /// Duration in minutes
    pub duration: i32,
    pub session_type: SessionType,
    pub status: AppointmentStatus,
    pub user_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookAppointment {
    #[validate(length(min = 1, message = "counsellor_id is required"))]
    pub counsellor_id: String,
    pub appointment_date: DateTime<Utc>,
    /// Minutes; the configured default applies when omitted
    pub duration: Option<i32>,
    #[serde(default)]
    pub session_type: SessionType,
    #[validate(length(max = 2000))]
    pub user_notes: Option<String>,
}

/// Fields written when an appointment is created
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub counsellor_id: String,
    pub user_id: String,
    pub appointment_date: DateTime<Utc>,
    pub duration: i32,
    pub session_type: SessionType,
    pub user_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatus {
    pub status: AppointmentStatus,
}

/// Appointment listing filter
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    /// Admin only; counsellors are always scoped to themselves
    pub counsellor_id: Option<String>,
    /// Admin only; youth users are always scoped to themselves
    pub user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
