use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced to callers of `login` and `signup`.
///
/// The session is left exactly as it was before the call whenever one of
/// these is returned.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    Rejected,

    #[error("Request refused: {0}")]
    Refused(String),

    #[error("Unable to reach the server: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to persist credentials: {0}")]
    Storage(#[source] anyhow::Error),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => AuthError::Rejected,
            ApiError::Forbidden(body) | ApiError::Conflict(body) | ApiError::BadRequest(body) => {
                AuthError::Refused(body)
            }
            ApiError::NotFound(body) => AuthError::Refused(format!("not found: {}", body)),
            ApiError::RateLimited => {
                AuthError::Refused("rate limited - please wait before retrying".to_string())
            }
            ApiError::Server(body) => AuthError::Server(body),
            ApiError::Transport(e) => AuthError::Network(e.to_string()),
            ApiError::InvalidResponse(msg) => AuthError::InvalidResponse(msg),
        }
    }
}

/// Why a stored token could not be turned back into a profile.
///
/// Every variant is recovered the same way during rehydration: the slot is
/// cleared and the session falls back to unauthenticated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Token expired")]
    Expired,

    #[error("Token invalid: {0}")]
    Invalid(String),

    #[error("Network failure: {0}")]
    Network(String),
}

impl From<ApiError> for ResolveError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => ResolveError::Expired,
            ApiError::Forbidden(body) | ApiError::NotFound(body) | ApiError::BadRequest(body) => {
                ResolveError::Invalid(body)
            }
            ApiError::Transport(e) => ResolveError::Network(e.to_string()),
            other => ResolveError::Network(other.to_string()),
        }
    }
}
