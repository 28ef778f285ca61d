use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod extract;
pub mod health;
pub mod leaderboard;
pub mod round;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(round::router())
        .merge(leaderboard::router())
        .merge(docs::router());

    api_router.with_state(state)
}
