//! Rating model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// A client's rating of a completed appointment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub id: Uuid,
    pub counsellor_id: String,
    /// Client who gave the rating
    pub user_id: String,
    pub appointment_id: Uuid,
    /// 1-5; may be missing on imported rows
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// The score, if present and within range
    pub fn score(&self) -> Option<f64> {
        self.rating
            .filter(|r| (MIN_SCORE..=MAX_SCORE).contains(r))
            .map(f64::from)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitRating {
    pub appointment_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub review: Option<String>,
}
