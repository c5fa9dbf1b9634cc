// ── Core error types ──
//
// User-facing errors from gameshelf-core. Unlike `gameshelf_api::Error`,
// these are `Clone`: a failed fetch is stored in the query cache and
// handed to every subscriber of that key, and a failed mutation is
// returned to the caller after the local state has been rolled back.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Network error: {reason}")]
    Network { reason: String },

    // ── Service responses ────────────────────────────────────────────
    /// Non-2xx response. `message` is the `Failed to <verb> <resource>: <status>`
    /// text, `detail` the server-supplied reason if there was one.
    #[error("{message}")]
    RequestFailed {
        message: String,
        status: u16,
        detail: Option<String>,
    },

    /// Payload rejected by the server or by local validation.
    #[error("{message}")]
    Validation { message: String },

    #[error("Authentication failed (HTTP {status})")]
    Unauthorized { status: u16, detail: Option<String> },

    #[error("Could not parse server response: {message}")]
    Deserialization { message: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("{resource} {id} no longer exists")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status of the failed response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } | Self::Unauthorized { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied `detail`, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { detail, .. } | Self::Unauthorized { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gameshelf_api::Error> for CoreError {
    fn from(err: gameshelf_api::Error) -> Self {
        use gameshelf_api::Error as Api;

        let message = err.to_string();
        match err {
            Api::Transport(e) => CoreError::Network {
                reason: e.to_string(),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid service URL: {e}"),
            },
            Api::InvalidHeader(reason) => CoreError::Internal(reason),
            Api::RequestFailed { status, detail, .. } => CoreError::RequestFailed {
                message,
                status,
                detail,
            },
            Api::Validation { message } => CoreError::Validation { message },
            Api::Auth { status, detail } => CoreError::Unauthorized { status, detail },
            Api::Search { status } => CoreError::RequestFailed {
                message,
                status,
                detail: None,
            },
            Api::Deserialization { message, .. } => CoreError::Deserialization { message },
        }
    }
}
