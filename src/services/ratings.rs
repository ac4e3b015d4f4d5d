//! Ratings of completed appointments

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::Appointment,
        enums::AppointmentStatus,
        rating::{Rating, SubmitRating},
        user::User,
    },
    repository::Repository,
};

/// A client may rate their own appointment once it is completed
pub fn check_rateable(client: &User, appointment: &Appointment) -> AppResult<()> {
    if appointment.user_id != client.id {
        return Err(AppError::Authorization(
            "Only the client of an appointment can rate it".to_string(),
        ));
    }
    if appointment.status != AppointmentStatus::Completed {
        return Err(AppError::BusinessRule(format!(
            "Appointment is {}, only completed appointments can be rated",
            appointment.status
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RatingsService {
    repository: Repository,
}

impl RatingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn submit(&self, client: &User, data: SubmitRating) -> AppResult<Rating> {
        let appointment = self.repository.appointments.get(data.appointment_id).await?;
        check_rateable(client, &appointment)?;

        let review = data
            .review
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let rating = self
            .repository
            .ratings
            .create(
                &appointment.counsellor_id,
                &client.id,
                appointment.id,
                data.rating,
                review,
            )
            .await?;

        tracing::info!(
            appointment_id = %appointment.id,
            counsellor_id = %appointment.counsellor_id,
            rating = data.rating,
            "Rating submitted"
        );
        Ok(rating)
    }

    pub async fn list_for_counsellor(&self, counsellor_id: &str) -> AppResult<Vec<Rating>> {
        self.repository.counsellors.get(counsellor_id).await?;
        self.repository.ratings.list_for_counsellor(counsellor_id).await
    }
}
