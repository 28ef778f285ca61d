use thiserror::Error;

use crate::dao::models::PhaseEntity;

/// Lifecycle phases of a round, declared in cycle order. The cycle has no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoundPhase {
    /// Players submit captions for the current meme.
    Submission,
    /// Captions are frozen and players vote on them.
    Voting,
    /// The winner is displayed before the next round starts.
    Results,
}

/// Events that can be applied to a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// A player adds a caption.
    SubmitCaption,
    /// A player votes for a caption.
    Vote,
    /// Move to the next phase (or the next round after results).
    Advance,
}

/// Error returned when an event is not legal in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the round was in when the event was received.
    pub from: RoundPhase,
    /// The rejected event.
    pub event: RoundEvent,
}

impl RoundPhase {
    /// Compute the phase reached by applying `event`.
    ///
    /// Caption and vote events are self-loops on their own phase; `Advance` from
    /// [`RoundPhase::Results`] yields [`RoundPhase::Submission`] of the next round.
    pub fn apply(self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (self, event) {
            (RoundPhase::Submission, RoundEvent::SubmitCaption) => RoundPhase::Submission,
            (RoundPhase::Voting, RoundEvent::Vote) => RoundPhase::Voting,
            (RoundPhase::Submission, RoundEvent::Advance) => RoundPhase::Voting,
            (RoundPhase::Voting, RoundEvent::Advance) => RoundPhase::Results,
            (RoundPhase::Results, RoundEvent::Advance) => RoundPhase::Submission,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

impl From<PhaseEntity> for RoundPhase {
    fn from(value: PhaseEntity) -> Self {
        match value {
            PhaseEntity::Submission => RoundPhase::Submission,
            PhaseEntity::Voting => RoundPhase::Voting,
            PhaseEntity::Results => RoundPhase::Results,
        }
    }
}

impl From<RoundPhase> for PhaseEntity {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Submission => PhaseEntity::Submission,
            RoundPhase::Voting => PhaseEntity::Voting,
            RoundPhase::Results => PhaseEntity::Results,
        }
    }
}
