//! Counsellor statistics snapshot

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Provenance of a single statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Computed from a successful read (may legitimately be zero)
    Ok,
    /// The read failed; `value` holds the display default
    Unavailable,
}

/// A statistic together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(MeasuredCount = Measured<u64>, MeasuredValue = Measured<f64>)]
pub struct Measured<T> {
    pub value: T,
    pub status: FieldStatus,
}

impl<T: Default> Measured<T> {
    pub fn ok(value: T) -> Self {
        Self { value, status: FieldStatus::Ok }
    }

    pub fn unavailable() -> Self {
        Self { value: T::default(), status: FieldStatus::Unavailable }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FieldStatus::Ok
    }
}

/// Overall provenance of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Ok,
    PartiallyUnavailable,
    Unavailable,
}

/// Point-in-time practice summary of one counsellor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounsellorStats {
    /// Distinct clients with a completed or confirmed appointment
    #[schema(value_type = MeasuredCount)]
    pub total_clients: Measured<u64>,
    /// Completed appointments in the current calendar month
    #[schema(value_type = MeasuredCount)]
    pub sessions_this_month: Measured<u64>,
    /// Mean rating in [0, 5], 0 when there are none
    #[schema(value_type = MeasuredValue)]
    pub average_rating: Measured<f64>,
    /// Whole hours of weekly availability
    #[schema(value_type = MeasuredValue)]
    pub hours_available: Measured<f64>,
}

impl CounsellorStats {
    pub fn status(&self) -> SnapshotStatus {
        let ok = [
            self.total_clients.is_ok(),
            self.sessions_this_month.is_ok(),
            self.average_rating.is_ok(),
            self.hours_available.is_ok(),
        ];
        match ok.iter().filter(|v| **v).count() {
            4 => SnapshotStatus::Ok,
            0 => SnapshotStatus::Unavailable,
            _ => SnapshotStatus::PartiallyUnavailable,
        }
    }
}

/// Lifecycle of a statistics board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BoardState {
    /// Nothing requested yet
    Idle,
    /// A refresh is in flight
    Loading,
    /// The latest refresh published a snapshot
    Ready,
    /// The latest refresh failed; any earlier snapshot is kept
    Stale,
}

/// Read-only view of a statistics board
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoardView {
    pub state: BoardState,
    pub counsellor_id: Option<String>,
    pub stats: Option<CounsellorStats>,
    pub status: Option<SnapshotStatus>,
    pub error: Option<String>,
    /// Token of the refresh that produced `stats`
    pub revision: u64,
}

/// Query parameters for the statistics endpoint
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    /// Caller's UTC offset in minutes, used for the "this month" window.
    /// Defaults to the server's local offset.
    pub utc_offset_minutes: Option<i32>,
}
