//! Counsellor settings: weekly working hours

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;

pub const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub const DEFAULT_START: &str = "09:00";
pub const DEFAULT_END: &str = "17:00";

/// One weekday entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    #[serde(default)]
    pub enabled: bool,
    /// Start time (HH:MM), defaults to 09:00
    pub start: Option<String>,
    /// End time (HH:MM), defaults to 17:00
    pub end: Option<String>,
}

impl DaySchedule {
    pub fn start(&self) -> &str {
        self.start.as_deref().unwrap_or(DEFAULT_START)
    }

    pub fn end(&self) -> &str {
        self.end.as_deref().unwrap_or(DEFAULT_END)
    }

    /// Whole hours available on this day. Minutes are ignored, so 09:30-17:00 counts 8.
    pub fn whole_hours(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        match (leading_hour(self.start()), leading_hour(self.end())) {
            (Some(start), Some(end)) => f64::from(end.saturating_sub(start).max(0)),
            _ => 0.0,
        }
    }
}

fn leading_hour(time: &str) -> Option<i32> {
    time.split(':').next()?.trim().parse().ok()
}

/// Day name -> schedule
pub type WorkingHours = BTreeMap<String, DaySchedule>;

/// Sum of whole hours over the seven weekdays; unknown keys are ignored
pub fn weekly_hours(hours: &WorkingHours) -> f64 {
    WEEKDAYS
        .iter()
        .filter_map(|day| hours.get(*day))
        .map(DaySchedule::whole_hours)
        .sum()
}

/// Check day keys and HH:MM times before a write
pub fn validate_working_hours(hours: &WorkingHours) -> Result<(), String> {
    for (day, schedule) in hours {
        if !WEEKDAYS.contains(&day.as_str()) {
            return Err(format!("Unknown day '{}'", day));
        }
        for time in [&schedule.start, &schedule.end].into_iter().flatten() {
            if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                return Err(format!("Invalid time '{}' for {} (use HH:MM)", time, day));
            }
        }
    }
    Ok(())
}

/// Settings record of one counsellor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CounsellorSettings {
    pub counsellor_id: String,
    #[schema(value_type = Object)]
    pub working_hours: Json<WorkingHours>,
    pub updated_at: DateTime<Utc>,
}

/// Replace the working hours of a counsellor
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWorkingHours {
    #[schema(value_type = Object)]
    pub working_hours: WorkingHours,
}
