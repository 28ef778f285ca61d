use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// Phase persisted alongside a round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEntity {
    Submission,
    Voting,
    Results,
}

/// Caption entry inside a persisted round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptionEntity {
    /// Identifier unique within the round.
    pub id: String,
    /// Caption text as submitted (trimmed).
    pub text: String,
    /// Number of votes received so far.
    pub votes: u32,
    /// Opaque identifier of the author.
    pub user_id: String,
}

/// The single "current round" document.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Round number, stored as a decimal string.
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    /// Reference to the meme shown during the round.
    pub content_ref: String,
    /// Captions in submission order.
    pub captions: Vec<CaptionEntity>,
    /// Current lifecycle phase.
    pub status: PhaseEntity,
    /// Winning caption, set once results are computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<CaptionEntity>,
    /// Users who already voted this round.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voters: Vec<String>,
}

/// Cumulative win counter for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    pub user_id: String,
    pub wins: u32,
}

/// The leaderboard document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntity {
    pub entries: Vec<LeaderboardEntryEntity>,
}
