//! HTTP-facing round operations. Every call leaves a timer armed for the
//! phase the round ends up in.

use tracing::debug;

use crate::{
    dto::{
        leaderboard::LeaderboardResponse,
        round::{RoundAction, RoundActionResponse, RoundResponse},
    },
    error::ServiceError,
    services::round_engine::AdvanceTrigger,
    state::{
        SharedState,
        transitions::{advance_and_rearm, rearm},
    },
};

/// Current round with the pending phase deadline, if automatic advancement is on.
pub async fn get_round(state: &SharedState) -> Result<RoundResponse, ServiceError> {
    let round = rearm(state, state.engine().current_round().await?).await;
    let deadline = state.timer().deadline_for(&round).await;
    Ok(RoundResponse::new(round, deadline))
}

pub async fn submit_caption(
    state: &SharedState,
    text: &str,
    user_id: &str,
) -> Result<RoundActionResponse, ServiceError> {
    let round = state.engine().submit_caption(text, user_id).await?;
    let round = rearm(state, round).await;
    Ok(RoundActionResponse::new(RoundAction::Caption, round))
}

pub async fn vote_caption(
    state: &SharedState,
    caption_id: &str,
    user_id: &str,
) -> Result<RoundActionResponse, ServiceError> {
    let round = state.engine().vote_caption(caption_id, user_id).await?;
    let round = rearm(state, round).await;
    Ok(RoundActionResponse::new(RoundAction::Vote, round))
}

/// Explicitly advance the round one phase.
pub async fn next_round(state: &SharedState) -> Result<RoundActionResponse, ServiceError> {
    let outcome = advance_and_rearm(state, AdvanceTrigger::Manual).await?;
    debug!(round_id = outcome.round().id, phase = ?outcome.round().status, "manual advance handled");
    Ok(RoundActionResponse::new(
        RoundAction::NextRound,
        outcome.into_round(),
    ))
}

pub async fn leaderboard(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    Ok(state.engine().leaderboard().snapshot().await?.into())
}
