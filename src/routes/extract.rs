use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's opaque identifier.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Identity used when the header is absent.
pub const GUEST_USER_ID: &str = "guest";

/// Caller identity taken from `X-User-Id`, defaulting to [`GUEST_USER_ID`].
///
/// A header that is not valid UTF-8 is rejected with 400, like a blank one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(UserId(GUEST_USER_ID.to_string()));
        };

        let user_id = std::str::from_utf8(value.as_bytes()).map_err(|_| {
            AppError::BadRequest("X-User-Id header must be valid UTF-8".to_string())
        })?;
        Ok(UserId(user_id.trim().to_string()))
    }
}
