//! User registration and management endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{DeleteUserQuery, RegisterUser, UpdateActive, UpdateRole, User, UserQuery},
};

use super::{AuthenticatedUser, CurrentUser, PaginatedResponse, UserPage};

/// Register the authenticated identity as a MindBridge user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    data.validate()?;
    let user = state.services.users.register(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Current user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not registered")
    )
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// List users (admin)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = UserPage),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let (users, total) = state.services.users.list(&admin, &query).await?;
    Ok(Json(PaginatedResponse::new(users, total, query.page, query.per_page)))
}

/// Change a user's role (admin)
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<crate::AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateRole>,
) -> AppResult<Json<User>> {
    let user = state.services.users.update_role(&admin, &id, data.role).await?;
    Ok(Json(user))
}

/// Activate or deactivate a user (admin)
#[utoipa::path(
    put,
    path = "/users/{id}/active",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateActive,
    responses(
        (status = 200, description = "Activation updated", body = User),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_active(
    State(state): State<crate::AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateActive>,
) -> AppResult<Json<User>> {
    let user = state.services.users.set_active(&admin, &id, data.is_active).await?;
    Ok(Json(user))
}

/// Export users matching the filters as CSV (admin)
#[utoipa::path(
    get,
    path = "/users/export",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn export_users(
    State(state): State<crate::AppState>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<UserQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = state.services.users.export_csv(&admin, &query).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"mindbridge-users.csv\"",
            ),
        ],
        csv,
    ))
}

/// Delete a user (admin)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID"),
        DeleteUserQuery
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "User not found"),
        (status = 422, description = "User has upcoming appointments")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<DeleteUserQuery>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(&admin, &id, query.force).await?;
    Ok(StatusCode::NO_CONTENT)
}
