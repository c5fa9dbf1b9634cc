//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `AuthError`, and `ConfigError` into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gameshelf_config::ConfigError;
use gameshelf_core::{AuthError, CoreError, FieldErrors};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(gameshelf::network),
        help("Check that the service is running and the profile's URLs are correct.")
    )]
    Network { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(gameshelf::auth_failed), help("Run: gameshelf auth login"))]
    AuthFailed { message: String },

    #[error("Not logged in")]
    #[diagnostic(code(gameshelf::not_logged_in), help("Run: gameshelf auth login"))]
    NotLoggedIn,

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(gameshelf::no_credentials),
        help(
            "Store one with: gameshelf config set-password --profile {profile}\n\
             Or set GAMESHELF_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(gameshelf::not_found), help("Run: gameshelf {list_command}"))]
    NotFound { message: String, list_command: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(gameshelf::api_error))]
    ApiError {
        message: String,
        detail: Option<String>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gameshelf::validation))]
    Validation { field: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(gameshelf::invalid_input))]
    Invalid(FieldErrors),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gameshelf::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gameshelf config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(
        code(gameshelf::config),
        help(
            "Create or edit the config with: gameshelf config init\n\
             Expected at: {path}"
        )
    )]
    Config { message: String, path: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gameshelf::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotLoggedIn | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Invalid(_) | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Network { .. } => CliError::Network { message },
            CoreError::Unauthorized { .. } => CliError::AuthFailed {
                message: "Session expired or invalid".into(),
            },
            CoreError::NotFound { resource, .. } => CliError::NotFound {
                message,
                list_command: format!("{resource}s list"),
            },
            CoreError::RequestFailed { status: 404, .. } => CliError::NotFound {
                message,
                list_command: "collections list".into(),
            },
            CoreError::RequestFailed { detail, .. } => CliError::ApiError { message, detail },
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { .. } => CliError::Config {
                message,
                path: gameshelf_config::config_path().display().to_string(),
            },
            CoreError::Deserialization { .. } | CoreError::Storage { .. } | CoreError::Internal(_) => {
                CliError::ApiError { message, detail: None }
            }
        }
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::Invalid(fields) => CliError::Invalid(fields),
            AuthError::NotConfigured => CliError::Config {
                message,
                path: gameshelf_config::config_path().display().to_string(),
            },
            AuthError::LoginNetwork | AuthError::SignupNetwork | AuthError::ProfileNetwork => {
                CliError::Network { message }
            }
            _ => CliError::AuthFailed { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: gameshelf_config::config_path().display().to_string(),
            },
        }
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {err}"),
        }
    }
}

impl From<FieldErrors> for CliError {
    fn from(errors: FieldErrors) -> Self {
        CliError::Invalid(errors)
    }
}
