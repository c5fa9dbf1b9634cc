// Game catalog search (`GET /igdb/search?q=...`).
//
// The catalog is a third-party service fronted by the game service; no
// auth header is sent and results are never persisted.

use tracing::debug;
use url::Url;

use crate::client::parse_json;
use crate::error::Error;
use crate::transport::{TransportConfig, normalize_base_url};
use crate::types::Game;

#[derive(Clone)]
pub struct GameSearchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GameSearchClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Search the catalog by free-text query.
    pub async fn search(&self, query: &str) -> Result<Vec<Game>, Error> {
        let url = self.base_url.join("igdb/search")?;
        debug!("GET {url} q={query:?}");

        let resp = self.http.get(url).query(&[("q", query)]).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search {
                status: status.as_u16(),
            });
        }
        parse_json(resp.text().await?)
    }
}
