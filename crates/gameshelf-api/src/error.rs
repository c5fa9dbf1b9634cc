use thiserror::Error;

/// Fixed guidance shown when the collections service rejects a create
/// request with 422 and no usable `detail`.
pub const COLLECTION_VALIDATION_FALLBACK: &str =
    "Invalid collection data. Name can only contain letters, numbers, and spaces.";

/// Top-level error type for the `gameshelf-api` crate.
///
/// Covers every failure mode across the three services: transport,
/// non-2xx responses, validation rejections, and malformed bodies.
/// `gameshelf-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (usually the bearer token) could not be encoded.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    // ── Collections service ─────────────────────────────────────────
    /// Non-2xx response from a collections or entries endpoint.
    #[error("Failed to {action} {resource}: {status}")]
    RequestFailed {
        action: &'static str,
        resource: &'static str,
        status: u16,
        /// Server-supplied `detail`, when the body carried one.
        detail: Option<String>,
    },

    /// Create-collection payload rejected by the server (HTTP 422).
    #[error("{message}")]
    Validation { message: String },

    // ── Auth service ────────────────────────────────────────────────
    /// Non-2xx response from `/login`, `/signup`, or `/me`.
    #[error("Authentication request failed (HTTP {status})")]
    Auth { status: u16, detail: Option<String> },

    // ── Game search ─────────────────────────────────────────────────
    #[error("Failed to search games. Please try again.")]
    Search { status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Could not parse server response: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Build the validation error for a rejected create-collection call.
    pub(crate) fn collection_validation(detail: Option<String>) -> Self {
        let message = detail.map_or_else(
            || COLLECTION_VALIDATION_FALLBACK.to_owned(),
            |d| format!("Validation error: {d}"),
        );
        Self::Validation { message }
    }

    /// HTTP status of the failed response, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. }
            | Self::Auth { status, .. }
            | Self::Search { status } => Some(*status),
            Self::Validation { .. } => Some(422),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-supplied `detail` message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { detail, .. } | Self::Auth { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_renders_verb_resource_and_status() {
        let err = Error::RequestFailed {
            action: "delete",
            resource: "collection",
            status: 500,
            detail: None,
        };
        assert_eq!(err.to_string(), "Failed to delete collection: 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn collection_validation_prefers_detail() {
        let err = Error::collection_validation(Some("name too short".into()));
        assert_eq!(err.to_string(), "Validation error: name too short");

        let err = Error::collection_validation(None);
        assert_eq!(err.to_string(), COLLECTION_VALIDATION_FALLBACK);
    }
}
