use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::leaderboard::LeaderboardResponse, error::AppError, services::round_service,
    state::SharedState,
};

/// Retrieve cumulative wins, best players first.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Leaderboard entries", body = LeaderboardResponse),
        (status = 503, description = "Round store unavailable")
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(round_service::leaderboard(&state).await?))
}

/// Configure the leaderboard routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/api/leaderboard", get(get_leaderboard))
}
