use axum::http::StatusCode;
use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Something went wrong.";
const UNAVAILABLE: &str = "The service is unreachable right now, try again shortly.";

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("{0}")]
    Validation(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    Identity(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("malformed document at {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

impl SwapError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    pub fn identity(message: impl Into<String>) -> Self {
        Self::Identity(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Identity(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Malformed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Backend details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(m) | Self::Identity(m) | Self::Forbidden(m) => m.clone(),
            Self::BackendUnavailable(_) => UNAVAILABLE.to_owned(),
            Self::Malformed { .. } => GENERIC_FAILURE.to_owned(),
        }
    }
}

impl From<sqlx::Error> for SwapError {
    fn from(err: sqlx::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Trims `value` and fails with a validation error naming `what` when nothing is left.
pub fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, SwapError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SwapError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed)
}
