//! Counsellor profiles repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::counsellor::{
        CounsellorListing, CounsellorProfile, DirectoryQuery, NewCounsellorProfile, UpdateProfile,
    },
};

use super::page_window;

#[derive(Clone)]
pub struct CounsellorsRepository {
    pool: Pool<Postgres>,
}

impl CounsellorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> AppResult<CounsellorProfile> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Counsellor {} not found", id)))
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<CounsellorProfile>> {
        let profile = sqlx::query_as::<_, CounsellorProfile>(
            "SELECT * FROM counsellor_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Create the starter profile; an existing profile is left untouched
    pub async fn create_if_missing(&self, data: &NewCounsellorProfile) -> AppResult<CounsellorProfile> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO counsellor_profiles
                (id, display_name, email, bio, specializations, qualifications, languages,
                 is_active, is_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, FALSE, $8, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&data.id)
        .bind(&data.display_name)
        .bind(&data.email)
        .bind(&data.bio)
        .bind(&data.specializations)
        .bind(&data.qualifications)
        .bind(&data.languages)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&data.id).await
    }

    /// Active counsellors with their rating summary, newest first
    pub async fn list_active(&self, query: &DirectoryQuery) -> AppResult<(Vec<CounsellorListing>, i64)> {
        let mut conditions = vec!["p.is_active = TRUE".to_string()];
        let mut idx = 1;

        if query.search.is_some() {
            conditions.push(format!(
                "(p.display_name ILIKE ${0} OR p.bio ILIKE ${0} \
                  OR EXISTS (SELECT 1 FROM unnest(p.specializations) s WHERE s ILIKE ${0}))",
                idx
            ));
            idx += 1;
        }
        if query.specialization.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM unnest(p.specializations) s WHERE LOWER(s) = LOWER(${}))",
                idx
            ));
            idx += 1;
        }

        let where_clause = conditions.join(" AND ");
        let (limit, offset) = page_window(query.page, query.per_page);
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s.trim()));

        let count_sql = format!("SELECT COUNT(*) FROM counsellor_profiles p WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref p) = pattern { count_query = count_query.bind(p); }
        if let Some(ref s) = query.specialization { count_query = count_query.bind(s); }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            r#"
            SELECT p.*,
                   COALESCE(AVG(r.rating::float8) FILTER (WHERE r.rating BETWEEN 1 AND 5), 0)::float8
                       AS average_rating,
                   COUNT(r.id) AS total_ratings
            FROM counsellor_profiles p
            LEFT JOIN ratings r ON r.counsellor_id = p.id
            WHERE {}
            GROUP BY p.id
            ORDER BY p.created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            idx,
            idx + 1
        );
        let mut list_query = sqlx::query_as::<_, CounsellorListing>(&list_sql);
        if let Some(ref p) = pattern { list_query = list_query.bind(p); }
        if let Some(ref s) = query.specialization { list_query = list_query.bind(s); }
        let listings = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((listings, total))
    }

    /// Update a profile; `None` fields are left unchanged
    pub async fn update(&self, id: &str, data: &UpdateProfile) -> AppResult<CounsellorProfile> {
        sqlx::query_as::<_, CounsellorProfile>(
            r#"
            UPDATE counsellor_profiles SET
                display_name     = COALESCE($2, display_name),
                bio              = COALESCE($3, bio),
                specializations  = COALESCE($4, specializations),
                qualifications   = COALESCE($5, qualifications),
                experience_years = COALESCE($6, experience_years),
                languages        = COALESCE($7, languages),
                is_active        = COALESCE($8, is_active),
                is_verified      = COALESCE($9, is_verified),
                updated_at       = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.display_name)
        .bind(&data.bio)
        .bind(&data.specializations)
        .bind(&data.qualifications)
        .bind(data.experience_years)
        .bind(&data.languages)
        .bind(data.is_active)
        .bind(data.is_verified)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Counsellor {} not found", id)))
    }
}
