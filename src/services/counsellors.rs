//! Counsellor directory and profiles

use crate::{
    error::{AppError, AppResult},
    models::{
        counsellor::{CounsellorListing, CounsellorProfile, DirectoryQuery, UpdateProfile},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CounsellorsService {
    repository: Repository,
}

impl CounsellorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &DirectoryQuery) -> AppResult<(Vec<CounsellorListing>, i64)> {
        self.repository.counsellors.list_active(query).await
    }

    pub async fn get(&self, id: &str) -> AppResult<CounsellorProfile> {
        self.repository.counsellors.get(id).await
    }

    /// Update a profile as its owner or an admin
    pub async fn update(&self, actor: &User, id: &str, data: UpdateProfile) -> AppResult<CounsellorProfile> {
        actor.require_counsellor_access(id)?;
        if !actor.is_admin() && (data.is_active.is_some() || data.is_verified.is_some()) {
            return Err(AppError::Authorization(
                "Only administrators may change activation or verification".to_string(),
            ));
        }

        let data = UpdateProfile {
            specializations: data.specializations.map(clean_list),
            languages: data.languages.map(clean_list),
            ..data
        };
        let profile = self.repository.counsellors.update(id, &data).await?;
        tracing::info!(counsellor_id = %id, updated_by = %actor.id, "Counsellor profile updated");
        Ok(profile)
    }
}

/// Trim entries and drop blanks and duplicates, keeping order
fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            out.push(value.to_string());
        }
    }
    out
}
