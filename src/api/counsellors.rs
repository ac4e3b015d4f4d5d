//! Counsellor directory endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        counsellor::{CounsellorListing, CounsellorProfile, DirectoryQuery, UpdateProfile},
        rating::Rating,
    },
};

use super::{CounsellorPage, CurrentUser, PaginatedResponse};

/// Active counsellors with rating summaries
#[utoipa::path(
    get,
    path = "/counsellors",
    tag = "counsellors",
    security(("bearer_auth" = [])),
    params(DirectoryQuery),
    responses(
        (status = 200, description = "Counsellor directory", body = CounsellorPage)
    )
)]
pub async fn list_counsellors(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<Json<PaginatedResponse<CounsellorListing>>> {
    let (listings, total) = state.services.counsellors.list(&query).await?;
    Ok(Json(PaginatedResponse::new(listings, total, query.page, query.per_page)))
}

/// Counsellor profile
#[utoipa::path(
    get,
    path = "/counsellors/{id}",
    tag = "counsellors",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID")
    ),
    responses(
        (status = 200, description = "Profile", body = CounsellorProfile),
        (status = 404, description = "Counsellor not found")
    )
)]
pub async fn get_counsellor(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CounsellorProfile>> {
    let profile = state.services.counsellors.get(&id).await?;
    Ok(Json(profile))
}

/// Update a profile (owner or admin)
#[utoipa::path(
    put,
    path = "/counsellors/{id}",
    tag = "counsellors",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID")
    ),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = CounsellorProfile),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Counsellor not found")
    )
)]
pub async fn update_counsellor(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Json<CounsellorProfile>> {
    data.validate()?;
    let profile = state.services.counsellors.update(&user, &id, data).await?;
    Ok(Json(profile))
}

/// Ratings received by a counsellor
#[utoipa::path(
    get,
    path = "/counsellors/{id}/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID")
    ),
    responses(
        (status = 200, description = "Ratings, newest first", body = Vec<Rating>),
        (status = 404, description = "Counsellor not found")
    )
)]
pub async fn list_ratings(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Rating>>> {
    let ratings = state.services.ratings.list_for_counsellor(&id).await?;
    Ok(Json(ratings))
}
