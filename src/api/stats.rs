//! Counsellor statistics endpoint

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::{
    error::{AppError, AppResult},
    models::stats::{BoardState, BoardView, StatsQuery},
    services::stats_board::StatsBoard,
};

use super::CurrentUser;

/// Current time in the caller's offset, or the server's local offset
fn caller_now(utc_offset_minutes: Option<i32>) -> AppResult<DateTime<FixedOffset>> {
    match utc_offset_minutes {
        Some(minutes) => {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Invalid UTC offset: {} minutes", minutes))
                })?;
            Ok(Utc::now().with_timezone(&offset))
        }
        None => Ok(Local::now().fixed_offset()),
    }
}

/// Practice summary of a counsellor (the counsellor or an admin)
#[utoipa::path(
    get,
    path = "/counsellors/{id}/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Counsellor ID"),
        StatsQuery
    ),
    responses(
        (status = 200, description = "Board view with the latest snapshot", body = BoardView),
        (status = 400, description = "Blank counsellor id or invalid offset"),
        (status = 403, description = "Not the counsellor or an administrator")
    )
)]
pub async fn get_counsellor_stats(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<BoardView>> {
    let id = id.trim();
    user.require_counsellor_access(id)?;
    let now = caller_now(query.utc_offset_minutes)?;

    let board = StatsBoard::new();
    state
        .services
        .stats
        .fetch_counsellor_stats(&board, id, now)
        .await;

    if board.state() == BoardState::Idle {
        return Err(AppError::Validation("Counsellor id is required".to_string()));
    }
    Ok(Json(board.view()))
}
