//! Counsellor settings repository

use chrono::Utc;
use sqlx::{types::Json, Pool, Postgres};

use crate::{
    error::AppResult,
    models::settings::{CounsellorSettings, WorkingHours},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn find(&self, counsellor_id: &str) -> AppResult<Option<CounsellorSettings>> {
        let row = sqlx::query_as::<_, CounsellorSettings>(
            "SELECT * FROM counsellor_settings WHERE counsellor_id = $1",
        )
        .bind(counsellor_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn upsert(&self, counsellor_id: &str, hours: &WorkingHours) -> AppResult<CounsellorSettings> {
        let row = sqlx::query_as::<_, CounsellorSettings>(
            r#"
            INSERT INTO counsellor_settings (counsellor_id, working_hours, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (counsellor_id)
            DO UPDATE SET working_hours = EXCLUDED.working_hours, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(counsellor_id)
        .bind(Json(hours))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
