//! Ratings repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::rating::Rating,
};

#[derive(Clone)]
pub struct RatingsRepository {
    pool: Pool<Postgres>,
}

impl RatingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list_for_counsellor(&self, counsellor_id: &str) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE counsellor_id = $1 ORDER BY created_at DESC",
        )
        .bind(counsellor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a rating; the unique index on appointment_id enforces one per appointment
    pub async fn create(
        &self,
        counsellor_id: &str,
        user_id: &str,
        appointment_id: Uuid,
        rating: i16,
        review: Option<&str>,
    ) -> AppResult<Rating> {
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (id, counsellor_id, user_id, appointment_id, rating, review, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(counsellor_id)
        .bind(user_id)
        .bind(appointment_id)
        .bind(rating)
        .bind(review)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::conflict_or_db(e, format!("Appointment {} has already been rated", appointment_id))
        })
    }
}
