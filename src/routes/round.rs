use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::round::{CaptionRequest, RoundActionResponse, RoundResponse, VoteRequest},
    error::AppError,
    routes::extract::UserId,
    services::round_service,
    state::SharedState,
};

/// Player-facing round endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/round", get(get_round))
        .route("/api/caption", post(submit_caption))
        .route("/api/vote", post(vote_caption))
        .route("/api/next-round", post(next_round))
}

/// Fetch the current round, creating the first one on a fresh deployment.
#[utoipa::path(
    get,
    path = "/api/round",
    tag = "round",
    responses(
        (status = 200, description = "Current round and pending phase deadline", body = RoundResponse),
        (status = 503, description = "Round store unavailable")
    )
)]
pub async fn get_round(State(state): State<SharedState>) -> Result<Json<RoundResponse>, AppError> {
    Ok(Json(round_service::get_round(&state).await?))
}

/// Submit a caption during the submission phase.
#[utoipa::path(
    post,
    path = "/api/caption",
    tag = "round",
    params(("X-User-Id" = Option<String>, Header, description = "Caller identity, `guest` when omitted")),
    request_body = CaptionRequest,
    responses(
        (status = 200, description = "Caption added", body = RoundActionResponse),
        (status = 400, description = "Wrong phase or invalid caption"),
        (status = 503, description = "Round store unavailable")
    )
)]
pub async fn submit_caption(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
    Json(payload): Json<CaptionRequest>,
) -> Result<Json<RoundActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        round_service::submit_caption(&state, &payload.text, &user_id).await?,
    ))
}

/// Vote for a caption during the voting phase.
#[utoipa::path(
    post,
    path = "/api/vote",
    tag = "round",
    params(("X-User-Id" = Option<String>, Header, description = "Caller identity, `guest` when omitted")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote counted", body = RoundActionResponse),
        (status = 400, description = "Wrong phase"),
        (status = 404, description = "Unknown caption"),
        (status = 409, description = "Caller already voted this round"),
        (status = 503, description = "Round store unavailable")
    )
)]
pub async fn vote_caption(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<RoundActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        round_service::vote_caption(&state, &payload.id, &user_id).await?,
    ))
}

/// Move the round to its next phase, or start the next round after results.
#[utoipa::path(
    post,
    path = "/api/next-round",
    tag = "round",
    responses(
        (status = 200, description = "Round advanced", body = RoundActionResponse),
        (status = 503, description = "Round store unavailable")
    )
)]
pub async fn next_round(
    State(state): State<SharedState>,
) -> Result<Json<RoundActionResponse>, AppError> {
    Ok(Json(round_service::next_round(&state).await?))
}
