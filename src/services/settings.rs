//! Counsellor working-hours settings

use crate::{
    error::{AppError, AppResult},
    models::{
        settings::{validate_working_hours, CounsellorSettings, WorkingHours},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, actor: &User, counsellor_id: &str) -> AppResult<CounsellorSettings> {
        actor.require_counsellor_access(counsellor_id)?;
        self.repository
            .settings
            .find(counsellor_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No settings stored for counsellor {}", counsellor_id))
            })
    }

    /// Replace the working hours of a counsellor
    pub async fn upsert(
        &self,
        actor: &User,
        counsellor_id: &str,
        hours: WorkingHours,
    ) -> AppResult<CounsellorSettings> {
        actor.require_counsellor_access(counsellor_id)?;
        validate_working_hours(&hours).map_err(AppError::Validation)?;

        // settings belong to an existing profile
        self.repository.counsellors.get(counsellor_id).await?;

        let settings = self.repository.settings.upsert(counsellor_id, &hours).await?;
        tracing::info!(counsellor_id, days = hours.len(), "Working hours updated");
        Ok(settings)
    }
}
