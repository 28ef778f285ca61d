use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::RoundPhase;

/// Round phase as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Captions are being collected.
    Submission,
    /// Captions are frozen and open for votes.
    Voting,
    /// The winner is on display.
    Results,
}

impl From<RoundPhase> for VisiblePhase {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Submission => VisiblePhase::Submission,
            RoundPhase::Voting => VisiblePhase::Voting,
            RoundPhase::Results => VisiblePhase::Results,
        }
    }
}
