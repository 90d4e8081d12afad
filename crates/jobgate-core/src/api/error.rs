use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the identity backend, classified by HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400/422: the backend refused the submitted fields
    #[error("Request rejected by identity backend: {0}")]
    BadRequest(String),

    /// 401: credentials wrong, or the bearer token expired or was revoked
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("No such account or endpoint: {0}")]
    NotFound(String),

    /// 409: typically an email already registered
    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Too many requests to identity backend")]
    RateLimited,

    #[error("Identity backend failed: {0}")]
    Server(String),

    #[error("Could not reach identity backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Response bodies longer than this are cut before they end up in errors
const BODY_PREVIEW_LIMIT: usize = 500;

fn preview(body: &str) -> String {
    if body.len() <= BODY_PREVIEW_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = preview(body);
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::BadRequest(body)
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(body),
            StatusCode::NOT_FOUND => ApiError::NotFound(body),
            StatusCode::CONFLICT => ApiError::Conflict(body),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            s if s.is_server_error() => ApiError::Server(body),
            s => ApiError::InvalidResponse(format!("HTTP {}: {}", s, body)),
        }
    }
}
