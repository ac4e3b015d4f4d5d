//! Rating endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::rating::{Rating, SubmitRating},
};

use super::CurrentUser;

/// Rate a completed appointment
#[utoipa::path(
    post,
    path = "/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    request_body = SubmitRating,
    responses(
        (status = 201, description = "Rating recorded", body = Rating),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Not the client of this appointment"),
        (status = 409, description = "Appointment already rated"),
        (status = 422, description = "Appointment not completed")
    )
)]
pub async fn submit_rating(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Json(data): Json<SubmitRating>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    data.validate()?;
    let rating = state.services.ratings.submit(&user, data).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}
