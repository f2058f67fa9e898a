use thiserror::Error;

use super::envelope::{Envelope, FailureOrigin};

/// A failed [`Envelope`], classified. Display is the user-facing message.
///
/// `Unauthorized` is reserved for a session that could not be recovered; a
/// plain 401 (e.g. wrong password on login) is `AccessDenied` with the
/// server's message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ServerError(String),

    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for server messages carried in errors
const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a server message to avoid logging excessive data
    fn truncate_message(message: &str) -> String {
        let total = message.chars().count();
        if total <= MAX_ERROR_MESSAGE_LENGTH {
            message.to_string()
        } else {
            let head: String = message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
            format!("{}... (truncated, {} total chars)", head, total)
        }
    }

    pub fn from_status(status: u16, message: &str) -> Self {
        let truncated = Self::truncate_message(message);
        match status {
            401 | 403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            400 | 409 | 422 => ApiError::Validation(truncated),
            429 => ApiError::RateLimited(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::Rejected {
                status: Some(status),
                message: truncated,
            },
        }
    }

    /// Classify a failed envelope. Returns `None` for a successful one.
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        if envelope.success {
            return None;
        }
        let message = envelope.message_or_default();
        Some(match envelope.origin {
            FailureOrigin::Transport => ApiError::Network(message),
            FailureOrigin::SessionEnded => ApiError::Unauthorized,
            FailureOrigin::Decode => ApiError::InvalidResponse(message),
            FailureOrigin::Response => match envelope.status {
                Some(status) => Self::from_status(status, &message),
                None => ApiError::Rejected {
                    status: None,
                    message: Self::truncate_message(&message),
                },
            },
        })
    }
}

/// Failure inside the HTTP transport: nothing usable came back.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),
}
