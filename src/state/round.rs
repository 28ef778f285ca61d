use indexmap::IndexSet;
use uuid::Uuid;

use crate::{
    dao::models::{CaptionEntity, RoundEntity},
    state::state_machine::RoundPhase,
};

/// Caption submitted by a player for the current meme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    /// Identifier unique within the round.
    pub id: String,
    /// Non-empty caption text.
    pub text: String,
    /// Votes received during the voting phase.
    pub votes: u32,
    /// Opaque identifier of the author.
    pub user_id: String,
}

impl Caption {
    /// Build a fresh caption with a random identifier and no votes.
    pub fn new(text: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            votes: 0,
            user_id,
        }
    }
}

/// One unit of gameplay: a meme, its captions and the phase they are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// Round number, strictly increasing from 1.
    pub id: u64,
    /// Reference to the content shown for this round.
    pub content_ref: String,
    /// Captions in submission order.
    pub captions: Vec<Caption>,
    /// Current phase.
    pub status: RoundPhase,
    /// Winning caption once results have been computed.
    pub winner: Option<Caption>,
    /// Users who voted this round, in voting order.
    pub voters: IndexSet<String>,
}

impl Round {
    /// The very first round of a fresh deployment.
    pub fn bootstrap(content_ref: String) -> Self {
        Self::numbered(1, content_ref)
    }

    /// The round that replaces `self` once its results have been shown.
    pub fn successor(&self, content_ref: String) -> Self {
        Self::numbered(self.id.saturating_add(1), content_ref)
    }

    fn numbered(id: u64, content_ref: String) -> Self {
        Self {
            id,
            content_ref,
            captions: Vec::new(),
            status: RoundPhase::Submission,
            winner: None,
            voters: IndexSet::new(),
        }
    }

    /// Position of `caption_id` in submission order.
    pub fn caption_index(&self, caption_id: &str) -> Option<usize> {
        self.captions
            .iter()
            .position(|caption| caption.id == caption_id)
    }

    /// Caption with the strictly highest vote count; on a tie the earliest
    /// submitted caption wins. `None` when nobody submitted anything.
    pub fn leading_caption(&self) -> Option<&Caption> {
        self.captions.iter().fold(None, |best, caption| match best {
            Some(current) if current.votes >= caption.votes => Some(current),
            _ => Some(caption),
        })
    }
}

impl From<CaptionEntity> for Caption {
    fn from(value: CaptionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            votes: value.votes,
            user_id: value.user_id,
        }
    }
}

impl From<Caption> for CaptionEntity {
    fn from(value: Caption) -> Self {
        Self {
            id: value.id,
            text: value.text,
            votes: value.votes,
            user_id: value.user_id,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            content_ref: value.content_ref,
            captions: value.captions.into_iter().map(Into::into).collect(),
            status: value.status.into(),
            winner: value.winner.map(Into::into),
            voters: value.voters.into_iter().collect(),
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            id: value.id,
            content_ref: value.content_ref,
            captions: value.captions.into_iter().map(Into::into).collect(),
            status: value.status.into(),
            winner: value.winner.map(Into::into),
            voters: value.voters.into_iter().collect(),
        }
    }
}
