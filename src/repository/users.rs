//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{NewUser, User, UserQuery},
    },
};

use super::page_window;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user with a system-assigned role
    pub async fn create(&self, data: &NewUser) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, display_name, role, age, is_active, is_professional,
                               qualifications, role_assigned_at, role_assigned_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8, 'system', $8, $8)
            RETURNING *
            "#,
        )
        .bind(&data.id)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(data.role)
        .bind(data.age)
        .bind(data.is_professional)
        .bind(&data.qualifications)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_or_db(e, "User or email already registered"))
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let (where_clause, idx) = filter_clause(query);
        let (limit, offset) = page_window(query.page, query.per_page);
        let pattern = search_pattern(query);

        let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref p) = pattern { count_query = count_query.bind(p); }
        if let Some(role) = query.role { count_query = count_query.bind(role); }
        if let Some(active) = query.is_active { count_query = count_query.bind(active); }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT * FROM users {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            where_clause,
            idx,
            idx + 1
        );
        let mut list_query = sqlx::query_as::<_, User>(&list_sql);
        if let Some(ref p) = pattern { list_query = list_query.bind(p); }
        if let Some(role) = query.role { list_query = list_query.bind(role); }
        if let Some(active) = query.is_active { list_query = list_query.bind(active); }
        let users = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    /// Every user matching the filters, oldest first (paging is ignored)
    pub async fn export(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let (where_clause, _) = filter_clause(query);
        let pattern = search_pattern(query);

        let sql = format!("SELECT * FROM users {} ORDER BY created_at ASC", where_clause);
        let mut export_query = sqlx::query_as::<_, User>(&sql);
        if let Some(ref p) = pattern { export_query = export_query.bind(p); }
        if let Some(role) = query.role { export_query = export_query.bind(role); }
        if let Some(active) = query.is_active { export_query = export_query.bind(active); }
        Ok(export_query.fetch_all(&self.pool).await?)
    }

    /// Sessions still ahead of a user, as client or counsellor
    pub async fn count_upcoming_appointments(&self, id: &str) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE (user_id = $1 OR counsellor_id = $1)
              AND status IN ('scheduled', 'confirmed')
              AND appointment_date > NOW()
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Remove a user with their counsellor profile and settings.
    ///
    /// Appointments and ratings are kept as history.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM counsellor_settings WHERE counsellor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM counsellor_profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Change the role and record who assigned it
    pub async fn update_role(&self, id: &str, role: Role, assigned_by: &str) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, role_assigned_at = $3, role_assigned_by = $4, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(now)
        .bind(assigned_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

/// WHERE clause for the user filters and the next free placeholder index
fn filter_clause(query: &UserQuery) -> (String, usize) {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if query.search.is_some() {
        conditions.push(format!("(display_name ILIKE ${0} OR email ILIKE ${0})", idx));
        idx += 1;
    }
    if query.role.is_some() {
        conditions.push(format!("role = ${}", idx));
        idx += 1;
    }
    if query.is_active.is_some() {
        conditions.push(format!("is_active = ${}", idx));
        idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, idx)
}

fn search_pattern(query: &UserQuery) -> Option<String> {
    query.search.as_ref().map(|s| format!("%{}%", s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_clause_numbers_placeholders() {
        let (clause, next) = filter_clause(&UserQuery::default());
        assert_eq!(clause, "");
        assert_eq!(next, 1);

        let query = UserQuery {
            search: Some("sam".into()),
            role: Some(Role::Counsellor),
            is_active: Some(true),
            ..Default::default()
        };
        let (clause, next) = filter_clause(&query);
        assert_eq!(
            clause,
            "WHERE (display_name ILIKE $1 OR email ILIKE $1) AND role = $2 AND is_active = $3"
        );
        assert_eq!(next, 4);
        assert_eq!(search_pattern(&query).as_deref(), Some("%sam%"));
    }
}
