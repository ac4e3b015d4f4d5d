//! Counsellor profile and directory listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::User;

pub const DEFAULT_BIO: &str = "Professional counsellor ready to help you.";
pub const DEFAULT_SPECIALIZATION: &str = "General Counseling";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Public profile of a counsellor, keyed by their user id
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CounsellorProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub specializations: Vec<String>,
    pub qualifications: Option<String>,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Starter profile written when a user becomes a counsellor
#[derive(Debug, Clone)]
pub struct NewCounsellorProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub specializations: Vec<String>,
    pub qualifications: Option<String>,
    pub languages: Vec<String>,
}

impl NewCounsellorProfile {
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            bio: DEFAULT_BIO.to_string(),
            specializations: vec![DEFAULT_SPECIALIZATION.to_string()],
            qualifications: user.qualifications.clone(),
            languages: vec![DEFAULT_LANGUAGE.to_string()],
        }
    }
}

/// Directory entry: profile plus rating summary
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CounsellorListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: CounsellorProfile,
    /// Mean of well-formed ratings, 0 when none
    pub average_rating: f64,
    /// Number of rating records, including malformed ones
    pub total_ratings: i64,
}

/// Directory search
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DirectoryQuery {
    /// Case-insensitive match on name, bio or specializations
    pub search: Option<String>,
    /// Exact specialization (case-insensitive)
    pub specialization: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Profile update, all fields optional
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 2, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 4000))]
    pub bio: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub qualifications: Option<String>,
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i32>,
    pub languages: Option<Vec<String>>,
    /// Admin only
    pub is_active: Option<bool>,
    /// Admin only
    pub is_verified: Option<bool>,
}
