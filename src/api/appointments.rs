//! Appointment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::appointment::{
        Appointment, AppointmentQuery, BookAppointment, UpdateAppointmentStatus,
    },
};

use super::{AppointmentPage, CurrentUser, PaginatedResponse};

/// Book an appointment
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    request_body = BookAppointment,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Invalid date or duration"),
        (status = 403, description = "Only active youth users can book"),
        (status = 404, description = "Counsellor not available")
    )
)]
pub async fn book_appointment(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Json(data): Json<BookAppointment>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    data.validate()?;
    let appointment = state
        .services
        .appointments
        .book(&user, data, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Appointments visible to the caller
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(AppointmentQuery),
    responses(
        (status = 200, description = "Appointments ordered by date", body = AppointmentPage)
    )
)]
pub async fn list_appointments(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AppointmentQuery>,
) -> AppResult<Json<PaginatedResponse<Appointment>>> {
    let (page, per_page) = (query.page, query.per_page);
    let (appointments, total) = state.services.appointments.list(&user, query).await?;
    Ok(Json(PaginatedResponse::new(appointments, total, page, per_page)))
}

/// Move an appointment through its lifecycle
#[utoipa::path(
    put,
    path = "/appointments/{id}/status",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    request_body = UpdateAppointmentStatus,
    responses(
        (status = 200, description = "Status updated", body = Appointment),
        (status = 403, description = "Not allowed for this actor"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Changed concurrently"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn update_status(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateAppointmentStatus>,
) -> AppResult<Json<Appointment>> {
    let appointment = state
        .services
        .appointments
        .update_status(&user, id, data.status)
        .await?;
    Ok(Json(appointment))
}

/// Email the client a reminder of an upcoming session
#[utoipa::path(
    post,
    path = "/appointments/{id}/reminder",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    responses(
        (status = 202, description = "Reminder sent"),
        (status = 403, description = "Not the counsellor or an administrator"),
        (status = 404, description = "Appointment not found"),
        (status = 422, description = "Appointment is not upcoming")
    )
)]
pub async fn send_reminder(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .services
        .appointments
        .send_reminder(&user, id, Utc::now())
        .await?;
    Ok(StatusCode::ACCEPTED)
}
