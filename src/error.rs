use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::state_machine::{InvalidTransition, RoundEvent, RoundPhase},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Operation attempted outside the phase it is legal in.
    #[error("invalid phase: {0}")]
    InvalidPhase(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The user already voted this round and repeat votes are disabled.
    #[error("duplicate vote: {0}")]
    DuplicateVote(String),
    /// Storage backend is unavailable or kept rejecting writes.
    #[error("storage unavailable")]
    StoreUnavailable(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::StoreUnavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        let required = match err.event {
            RoundEvent::SubmitCaption => "submission",
            RoundEvent::Vote => "voting",
            RoundEvent::Advance => "any",
        };
        ServiceError::InvalidPhase(format!(
            "not in {required} phase (current phase: {})",
            phase_name(err.from)
        ))
    }
}

fn phase_name(phase: RoundPhase) -> &'static str {
    match phase {
        RoundPhase::Submission => "submission",
        RoundPhase::Voting => "voting",
        RoundPhase::Results => "results",
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input or a phase mismatch.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidPhase(message) => AppError::BadRequest(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::DuplicateVote(message) => AppError::Conflict(message),
            ServiceError::StoreUnavailable(source) => {
                AppError::ServiceUnavailable(source.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_phase_maps_to_bad_request() {
        let err: ServiceError = InvalidTransition {
            from: RoundPhase::Voting,
            event: RoundEvent::SubmitCaption,
        }
        .into();
        assert!(matches!(err, ServiceError::InvalidPhase(ref msg) if msg.contains("submission")));

        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_map_to_service_unavailable() {
        let err = ServiceError::from(StorageError::Contention {
            key: "current_round",
            attempts: 3,
        });
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
