//! Wire representation of rounds and the payloads of the round endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{format_system_time, phase::VisiblePhase, validation::validate_caption_text},
    services::phase_timer::PhaseDeadline,
    state::round::{Caption, Round},
};

/// Caption as shown to players.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptionView {
    /// Identifier to send back when voting.
    pub id: String,
    pub text: String,
    /// Votes received so far.
    pub votes: u32,
    /// Author of the caption.
    pub user_id: String,
}

impl From<Caption> for CaptionView {
    fn from(caption: Caption) -> Self {
        Self {
            id: caption.id,
            text: caption.text,
            votes: caption.votes,
            user_id: caption.user_id,
        }
    }
}

/// Public projection of a round. Voter lists stay server-side.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    /// Round number rendered as a string.
    pub id: String,
    /// Meme shown during the round.
    pub content_ref: String,
    /// Captions in submission order.
    pub captions: Vec<CaptionView>,
    pub status: VisiblePhase,
    /// Present once results are computed and someone submitted a caption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<CaptionView>,
}

impl From<Round> for RoundView {
    fn from(round: Round) -> Self {
        Self {
            id: round.id.to_string(),
            content_ref: round.content_ref,
            captions: round.captions.into_iter().map(CaptionView::from).collect(),
            status: round.status.into(),
            winner: round.winner.map(CaptionView::from),
        }
    }
}

/// Response of `GET /api/round`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub round: RoundView,
    /// Whole seconds until the phase advances on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<u64>,
    /// RFC 3339 instant at which the phase advances on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_ends_at: Option<String>,
}

impl RoundResponse {
    pub fn new(round: Round, deadline: Option<PhaseDeadline>) -> Self {
        Self {
            round: round.into(),
            // Rounded up so a pending timer never reads as 0.
            time_left: deadline.map(|deadline| deadline.remaining.as_secs_f64().ceil() as u64),
            phase_ends_at: deadline.map(|deadline| format_system_time(deadline.ends_at)),
        }
    }
}

/// Operation that produced a [`RoundActionResponse`].
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RoundAction {
    /// A caption was submitted.
    Caption,
    /// A vote was counted.
    Vote,
    /// The round moved to its next phase.
    NextRound,
}

/// Response of the mutating round endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundActionResponse {
    #[serde(rename = "type")]
    pub action: RoundAction,
    pub round: RoundView,
}

impl RoundActionResponse {
    pub fn new(action: RoundAction, round: Round) -> Self {
        Self {
            action,
            round: round.into(),
        }
    }
}

/// Payload of `POST /api/caption`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CaptionRequest {
    #[validate(custom(function = "validate_caption_text"))]
    pub text: String,
}

/// Payload of `POST /api/vote`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteRequest {
    /// Identifier of the caption being voted for.
    #[validate(length(min = 1, message = "Caption id must not be empty"))]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use serde_json::json;

    use super::*;
    use crate::state::state_machine::RoundPhase;

    fn sample_round() -> Round {
        let mut round = Round::bootstrap("/memes/meme1.png".into());
        round.captions.push(Caption {
            id: "c1".into(),
            text: "lol".into(),
            votes: 2,
            user_id: "u1".into(),
        });
        round.voters.insert("u2".into());
        round
    }

    #[test]
    fn round_view_uses_camel_case_and_hides_voters() {
        let value = serde_json::to_value(RoundView::from(sample_round())).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "contentRef": "/memes/meme1.png",
                "captions": [{ "id": "c1", "text": "lol", "votes": 2, "userId": "u1" }],
                "status": "submission",
            })
        );
    }

    #[test]
    fn winner_is_rendered_once_known() {
        let mut round = sample_round();
        round.status = RoundPhase::Results;
        round.winner = round.captions.first().cloned();

        let value = serde_json::to_value(RoundView::from(round)).unwrap();
        assert_eq!(value["status"], "results");
        assert_eq!(value["winner"]["id"], "c1");
    }

    #[test]
    fn action_response_carries_type_tag() {
        let response = RoundActionResponse::new(RoundAction::NextRound, sample_round());
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["type"], "next-round");
        assert_eq!(value["round"]["id"], "1");
    }

    #[test]
    fn deadline_fields_are_optional() {
        let value = serde_json::to_value(RoundResponse::new(sample_round(), None)).unwrap();
        assert!(value.get("timeLeft").is_none());
        assert!(value.get("phaseEndsAt").is_none());

        let deadline = PhaseDeadline {
            remaining: Duration::from_millis(4_200),
            ends_at: UNIX_EPOCH + Duration::from_secs(60),
        };
        let value =
            serde_json::to_value(RoundResponse::new(sample_round(), Some(deadline))).unwrap();
        assert_eq!(value["timeLeft"], 5);
        assert_eq!(value["phaseEndsAt"], "1970-01-01T00:01:00Z");
    }

    #[test]
    fn blank_caption_fails_validation() {
        let request = CaptionRequest { text: "   ".into() };
        assert!(request.validate().is_err());
        let request = CaptionRequest { text: "ok".into() };
        assert!(request.validate().is_ok());
    }
}
