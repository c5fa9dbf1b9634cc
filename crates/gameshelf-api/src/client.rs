// Collections service HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// and status-to-error mapping. Endpoint methods live in `collections.rs`
// and `entries.rs` as inherent impls to keep this module focused on
// transport mechanics.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::Error;
use crate::transport::{TransportConfig, normalize_base_url};

/// Verb + resource pair used to render `Failed to <verb> <resource>: <status>`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Operation {
    pub action: &'static str,
    pub resource: &'static str,
}

impl Operation {
    pub(crate) const fn new(action: &'static str, resource: &'static str) -> Self {
        Self { action, resource }
    }

    fn failed(self, status: u16, detail: Option<String>) -> Error {
        Error::RequestFailed {
            action: self.action,
            resource: self.resource,
            status,
            detail,
        }
    }
}

/// FastAPI-style error body. `detail` is either a string or a list of
/// `{loc, msg, type}` objects for validation failures.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extract a human-readable `detail` from an error body, if present.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_owned)
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

/// Decode a 2xx body, keeping a preview of the raw text on failure.
pub(crate) fn parse_json<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Async client for the collections service.
///
/// Every request carries `Content-Type: application/json`; when the
/// injected [`TokenProvider`] yields a token, `Authorization: Bearer`
/// is attached as well. No retries and no caching happen here.
#[derive(Clone)]
pub struct ShelfClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl ShelfClient {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenProvider>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, tokens)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Request building ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Start a request with the JSON content type and, when a session
    /// token is available, the bearer header.
    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match self.tokens.bearer_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        op: Operation,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(Method::GET, url).send().await?;
        Self::handle_response(resp, op).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        op: Operation,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.request(Method::POST, url).json(body).send().await?;
        Self::handle_response(resp, op).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        op: Operation,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.request(Method::PUT, url).json(body).send().await?;
        Self::handle_response(resp, op).await
    }

    pub(crate) async fn delete(&self, path: &str, op: Operation) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.request(Method::DELETE, url).send().await?;
        Self::handle_empty(resp, op).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        op: Operation,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            parse_json(body)
        } else {
            Err(op.failed(status.as_u16(), error_detail(&body)))
        }
    }

    async fn handle_empty(resp: reqwest::Response, op: Operation) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(op.failed(status.as_u16(), error_detail(&body)))
    }
}
