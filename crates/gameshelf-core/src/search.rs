// ── Game catalog search ──

use std::sync::Arc;

use gameshelf_api::{Game, GameSearchClient};

use crate::cache::CacheEntry;
use crate::config::CachePolicy;
use crate::error::CoreError;
use crate::model::search_key;
use crate::store::ShelfStore;

pub const SEARCH_NOT_CONFIGURED: &str = "Game API URL is not configured.";

#[derive(Clone)]
pub struct SearchHandle {
    client: Option<GameSearchClient>,
    store: Arc<ShelfStore>,
    policy: CachePolicy,
}

impl SearchHandle {
    pub(crate) fn new(client: Option<GameSearchClient>, store: Arc<ShelfStore>, policy: CachePolicy) -> Self {
        Self { client, store, policy }
    }

    /// Search the catalog. Blank queries return nothing without a
    /// request; results are cached per trimmed query.
    pub async fn search(&self, query: &str) -> Result<Vec<Game>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let client = self.client.as_ref().ok_or_else(|| CoreError::Config {
            message: SEARCH_NOT_CONFIGURED.into(),
        })?;
        self.store
            .games
            .get_or_fetch(&search_key(query), self.policy.dedupe_interval, async move {
                client.search(query).await.map_err(CoreError::from)
            })
            .await
    }

    pub fn state(&self, query: &str) -> CacheEntry<Vec<Game>> {
        self.store.games.peek(&search_key(query.trim())).unwrap_or_default()
    }
}
