// Auth service client and bearer-token injection
//
// `TokenProvider` is the seam between the HTTP layer and whatever holds
// the session. The collections client asks it for a token on every
// request; the auth client talks to `/login`, `/signup`, and `/me`.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::client::{error_detail, parse_json};
use crate::error::Error;
use crate::transport::{TransportConfig, normalize_base_url};
use crate::types::{LoginRequest, SignupRequest, TokenResponse, UserProfile};

/// Source of the bearer token attached to outgoing requests.
///
/// Returning `None` must not block a request: the server decides
/// whether an anonymous call is allowed.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Provider that never supplies a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }
}

/// Provider with a fixed token (scripts, tests).
#[derive(Debug, Clone)]
pub struct StaticToken(pub SecretString);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

/// Raw HTTP client for the auth service.
///
/// Unlike [`ShelfClient`](crate::ShelfClient), callers get the raw
/// [`TokenResponse`] back so they can distinguish "no token in body"
/// from a parse failure.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /login` with email and password.
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, Error> {
        let url = self.base_url.join("login")?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(request).send().await?;
        Self::token_response(resp).await
    }

    /// `POST /signup` with username, email, and password.
    pub async fn signup(&self, request: &SignupRequest) -> Result<TokenResponse, Error> {
        let url = self.base_url.join("signup")?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(request).send().await?;
        Self::token_response(resp).await
    }

    /// `GET /me` with the given bearer token.
    pub async fn me(&self, token: &SecretString) -> Result<UserProfile, Error> {
        let url = self.base_url.join("me")?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        parse_json(body)
    }

    async fn token_response(resp: reqwest::Response) -> Result<TokenResponse, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        parse_json(body)
    }
}
