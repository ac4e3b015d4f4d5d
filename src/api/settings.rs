//! Counsellor working-hours endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::settings::{CounsellorSettings, UpdateWorkingHours},
};

use super::CurrentUser;

/// Working hours of a counsellor (owner or admin)
#[utoipa::path(
    get,
    path = "/counsellors/{id}/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID")
    ),
    responses(
        (status = 200, description = "Stored settings", body = CounsellorSettings),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No settings stored")
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CounsellorSettings>> {
    let settings = state.services.settings.get(&user, &id).await?;
    Ok(Json(settings))
}

/// Replace working hours (owner or admin)
#[utoipa::path(
    put,
    path = "/counsellors/{id}/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID")
    ),
    request_body = UpdateWorkingHours,
    responses(
        (status = 200, description = "Settings saved", body = CounsellorSettings),
        (status = 400, description = "Unknown day or malformed time"),
        (status = 403, description = "Not the owner")
    )
)]
pub async fn update_settings(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateWorkingHours>,
) -> AppResult<Json<CounsellorSettings>> {
    let settings = state
        .services
        .settings
        .upsert(&user, &id, data.working_hours)
        .await?;
    Ok(Json(settings))
}
