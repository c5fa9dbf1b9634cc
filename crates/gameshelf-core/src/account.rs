// ── Account flows ──
//
// Login, signup, and logout as the auth screens drive them. Each flow
// returns the route to navigate to on success; every failure maps to
// one fixed, user-facing message.

use std::sync::Arc;

use gameshelf_api::{AuthClient, LoginRequest, SignupRequest, TokenResponse};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info};

use crate::session::SessionStore;
use crate::store::ShelfStore;
use crate::validation::{FieldErrors, validate_login, validate_signup};

pub const SIGNUP_REJECTED_FALLBACK: &str = "Invalid signup. Please check your details and try again.";

/// Where to go after a flow completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum Route {
    #[strum(serialize = "/")]
    Home,
    #[strum(serialize = "/login")]
    Login,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Auth API URL is not configured. Please set GAMESHELF_AUTH_URL.")]
    NotConfigured,

    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("Invalid credentials. Please check your email and password.")]
    InvalidCredentials,

    #[error("{message}")]
    SignupRejected { message: String },

    #[error("Unexpected error: Could not parse server response.")]
    MalformedResponse,

    #[error("Unexpected error: No token received from server.")]
    MissingToken,

    #[error("Unexpected error: Could not get user information.")]
    ProfileUnavailable,

    #[error("Network error: Could not get user information.")]
    ProfileNetwork,

    #[error("Network error: Unable to login. Please try again.")]
    LoginNetwork,

    #[error("Network error: Unable to sign up. Please try again.")]
    SignupNetwork,

    #[error("Could not save session: {0}")]
    Session(String),
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

#[derive(Clone)]
pub struct Account {
    auth: Option<AuthClient>,
    session: Arc<SessionStore>,
    store: Arc<ShelfStore>,
}

impl Account {
    pub(crate) fn new(auth: Option<AuthClient>, session: Arc<SessionStore>, store: Arc<ShelfStore>) -> Self {
        Self { auth, session, store }
    }

    /// `POST /login`, then `GET /me` with the new token, then store both.
    pub async fn login(&self, form: &LoginForm) -> Result<Route, AuthError> {
        let auth = self.auth.as_ref().ok_or(AuthError::NotConfigured)?;
        validate_login(&form.email, form.password.expose_secret()).map_err(AuthError::Invalid)?;

        let request = LoginRequest {
            email: form.email.trim().to_owned(),
            password: form.password.expose_secret().to_owned(),
        };
        let response = auth.login(&request).await.map_err(|e| match e {
            gameshelf_api::Error::Auth { status, .. } => {
                debug!(status, "login rejected");
                AuthError::InvalidCredentials
            }
            gameshelf_api::Error::Deserialization { .. } => AuthError::MalformedResponse,
            _ => AuthError::LoginNetwork,
        })?;
        let token = access_token(response)?;

        let profile = auth.me(&token).await.map_err(|e| match e {
            gameshelf_api::Error::Auth { .. } => AuthError::ProfileUnavailable,
            _ => AuthError::ProfileNetwork,
        })?;

        self.session
            .login(token, Some(profile))
            .map_err(|e| AuthError::Session(e.to_string()))?;
        info!(email = %request.email, "logged in");
        Ok(Route::Home)
    }

    /// Validate locally, `POST /signup`, then store the token. No
    /// profile is fetched.
    pub async fn signup(&self, form: &SignupForm) -> Result<Route, AuthError> {
        validate_signup(
            &form.username,
            &form.email,
            form.password.expose_secret(),
            form.confirm_password.expose_secret(),
        )
        .map_err(AuthError::Invalid)?;
        let auth = self.auth.as_ref().ok_or(AuthError::NotConfigured)?;

        let request = SignupRequest {
            username: form.username.trim().to_owned(),
            email: form.email.trim().to_owned(),
            password: form.password.expose_secret().to_owned(),
        };
        let response = auth.signup(&request).await.map_err(|e| match e {
            gameshelf_api::Error::Auth { detail, .. } => AuthError::SignupRejected {
                message: detail.unwrap_or_else(|| SIGNUP_REJECTED_FALLBACK.to_owned()),
            },
            gameshelf_api::Error::Deserialization { .. } => AuthError::MalformedResponse,
            _ => AuthError::SignupNetwork,
        })?;
        let token = access_token(response)?;

        self.session
            .login(token, None)
            .map_err(|e| AuthError::Session(e.to_string()))?;
        info!(username = %request.username, "signed up");
        Ok(Route::Home)
    }

    /// Clear the session and every cached query of the departing user.
    /// Safe to call when already logged out.
    pub fn logout(&self) -> Result<Route, AuthError> {
        self.session
            .logout()
            .map_err(|e| AuthError::Session(e.to_string()))?;
        self.store.clear();
        info!("logged out");
        Ok(Route::Login)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }
}

fn access_token(response: TokenResponse) -> Result<SecretString, AuthError> {
    response
        .access_token
        .filter(|t| !t.is_empty())
        .map(SecretString::from)
        .ok_or(AuthError::MissingToken)
}
