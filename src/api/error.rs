//! Error taxonomy for CREST and OAuth2 calls
//!
//! Every failure surfaced by the library is a [`CrestError`]. Retry decisions are
//! made on its [`ErrorKind`] only, never on raw status codes at the call site.

use serde_json::Value;
use thiserror::Error;

/// Closed classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed caller input, detected before any I/O
    Validation,
    /// The session provider could not produce a session
    Session,
    /// The server rejected the session as invalid or expired
    AuthExpired,
    /// No HTTP response was received
    Transport,
    /// Any other non-success HTTP response
    Status,
    /// The token endpoint rejected the grant or the client
    Grant,
}

impl ErrorKind {
    /// Classify a non-success CREST status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::AuthExpired,
            _ => ErrorKind::Status,
        }
    }

    /// Whether this kind of failure warrants refreshing the session and retrying
    pub fn triggers_reauth(&self) -> bool {
        matches!(self, ErrorKind::AuthExpired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Session => "session",
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::Transport => "transport",
            ErrorKind::Status => "status",
            ErrorKind::Grant => "grant",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a gateway or token operation.
///
/// Cloneable so one failed discovery fetch can be handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CrestError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("session error: {0}")]
    Session(String),

    /// The server rejected the session (HTTP 401). Triggers one
    /// re-authenticated retry; when that retry is rejected as well, this is
    /// the terminal outcome of the call, carrying the second response.
    #[error("session rejected by server (HTTP {status}): {body}")]
    AuthExpired { status: u16, body: Value },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed with HTTP {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("token request rejected (HTTP {status}): {body}")]
    Grant { status: u16, body: Value },
}

impl CrestError {
    pub fn validation(message: impl Into<String>) -> Self {
        CrestError::Validation(message.into())
    }

    /// Build the error for a non-success CREST response
    pub fn from_status(status: u16, body: Value) -> Self {
        match ErrorKind::from_status(status) {
            ErrorKind::AuthExpired => CrestError::AuthExpired { status, body },
            _ => CrestError::Status { status, body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CrestError::Validation(_) => ErrorKind::Validation,
            CrestError::Session(_) => ErrorKind::Session,
            CrestError::AuthExpired { .. } => ErrorKind::AuthExpired,
            CrestError::Transport(_) => ErrorKind::Transport,
            CrestError::Status { .. } => ErrorKind::Status,
            CrestError::Grant { .. } => ErrorKind::Grant,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            CrestError::AuthExpired { status, .. }
            | CrestError::Status { status, .. }
            | CrestError::Grant { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded response body, when the failure came with one
    pub fn body(&self) -> Option<&Value> {
        match self {
            CrestError::AuthExpired { body, .. }
            | CrestError::Status { body, .. }
            | CrestError::Grant { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CrestError {
    fn from(error: reqwest::Error) -> Self {
        CrestError::Transport(error.to_string())
    }
}
