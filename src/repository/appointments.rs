//! Appointments repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentQuery, NewAppointment},
        enums::AppointmentStatus,
    },
};

use super::page_window;

#[derive(Clone)]
pub struct AppointmentsRepository {
    pool: Pool<Postgres>,
}

impl AppointmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    /// Insert a booking with status `scheduled`
    pub async fn create(&self, data: &NewAppointment) -> AppResult<Appointment> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (id, counsellor_id, user_id, appointment_date, duration,
                                      session_type, status, user_notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.counsellor_id)
        .bind(&data.user_id)
        .bind(data.appointment_date)
        .bind(data.duration)
        .bind(data.session_type)
        .bind(AppointmentStatus::Scheduled)
        .bind(&data.user_notes)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// All appointments of a counsellor, optionally restricted to some statuses.
    /// An empty `statuses` slice means no status filter.
    pub async fn list_for_counsellor(
        &self,
        counsellor_id: &str,
        statuses: &[AppointmentStatus],
    ) -> AppResult<Vec<Appointment>> {
        let rows = if statuses.is_empty() {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE counsellor_id = $1",
            )
            .bind(counsellor_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            let slugs: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE counsellor_id = $1 AND status = ANY($2)",
            )
            .bind(counsellor_id)
            .bind(slugs)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    /// Filtered listing ordered by appointment date
    pub async fn search(&self, query: &AppointmentQuery) -> AppResult<(Vec<Appointment>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() { conditions.push(format!("status = ${}", idx)); idx += 1; }
        if query.counsellor_id.is_some() { conditions.push(format!("counsellor_id = ${}", idx)); idx += 1; }
        if query.user_id.is_some() { conditions.push(format!("user_id = ${}", idx)); idx += 1; }
        if query.from.is_some() { conditions.push(format!("appointment_date >= ${}", idx)); idx += 1; }
        if query.to.is_some() { conditions.push(format!("appointment_date <= ${}", idx)); idx += 1; }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let (limit, offset) = page_window(query.page, query.per_page);

        let count_sql = format!("SELECT COUNT(*) FROM appointments {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(status) = query.status { count_query = count_query.bind(status); }
        if let Some(ref c) = query.counsellor_id { count_query = count_query.bind(c); }
        if let Some(ref u) = query.user_id { count_query = count_query.bind(u); }
        if let Some(from) = query.from { count_query = count_query.bind(from); }
        if let Some(to) = query.to { count_query = count_query.bind(to); }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT * FROM appointments {} ORDER BY appointment_date LIMIT ${} OFFSET ${}",
            where_clause,
            idx,
            idx + 1
        );
        let mut list_query = sqlx::query_as::<_, Appointment>(&list_sql);
        if let Some(status) = query.status { list_query = list_query.bind(status); }
        if let Some(ref c) = query.counsellor_id { list_query = list_query.bind(c); }
        if let Some(ref u) = query.user_id { list_query = list_query.bind(u); }
        if let Some(from) = query.from { list_query = list_query.bind(from); }
        if let Some(to) = query.to { list_query = list_query.bind(to); }
        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Compare-and-set the status so concurrent transitions cannot both succeed
    pub async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> AppResult<Appointment> {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Appointment {} changed status concurrently", id))
        })
    }
}
