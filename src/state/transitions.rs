use crate::{
    error::ServiceError,
    services::round_engine::{AdvanceOutcome, AdvanceTrigger},
    state::{SharedState, round::Round},
};

/// Advance the current round, then make sure a timer covers whichever phase it landed in.
pub async fn advance_and_rearm(
    state: &SharedState,
    trigger: AdvanceTrigger,
) -> Result<AdvanceOutcome, ServiceError> {
    let outcome = state.engine().advance_phase(trigger).await?;
    state.timer().arm(outcome.round()).await;
    Ok(outcome)
}

/// Arm the timer for `round` and hand it back, for operations that keep the phase.
pub async fn rearm(state: &SharedState, round: Round) -> Round {
    state.timer().arm(&round).await;
    round
}
