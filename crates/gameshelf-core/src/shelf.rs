// ── Shelf facade ──
//
// Wires the session store into the HTTP clients and hands out the
// hooks. Cheaply cloneable; every clone shares one session and one
// cache.

use std::sync::Arc;

use gameshelf_api::{AuthClient, GameSearchClient, ShelfClient, TransportConfig};
use tracing::debug;

use crate::account::Account;
use crate::collections::CollectionsHandle;
use crate::config::ShelfConfig;
use crate::entries::EntriesHandle;
use crate::error::CoreError;
use crate::library::LibraryHandle;
use crate::search::SearchHandle;
use crate::session::{SessionStorage, SessionStore};
use crate::store::ShelfStore;

#[derive(Clone)]
pub struct Shelf {
    inner: Arc<ShelfInner>,
}

struct ShelfInner {
    config: ShelfConfig,
    session: Arc<SessionStore>,
    client: ShelfClient,
    auth: Option<AuthClient>,
    search: Option<GameSearchClient>,
    store: Arc<ShelfStore>,
}

impl Shelf {
    /// Rehydrate the session from `storage` and build the clients.
    pub fn new(config: ShelfConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, CoreError> {
        Self::with_session(config, Arc::new(SessionStore::open(storage)))
    }

    pub fn with_session(config: ShelfConfig, session: Arc<SessionStore>) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let http = transport.build_client()?;

        let client = ShelfClient::with_client(http.clone(), config.service_url.as_str(), session.clone())?;
        let auth = config
            .auth_url
            .as_ref()
            .map(|url| AuthClient::with_client(http.clone(), url.as_str()))
            .transpose()?;
        let search = config
            .search_url
            .as_ref()
            .map(|url| GameSearchClient::with_client(http.clone(), url.as_str()))
            .transpose()?;
        debug!(
            service = %config.service_url,
            auth = auth.is_some(),
            search = search.is_some(),
            "shelf ready"
        );

        Ok(Self {
            inner: Arc::new(ShelfInner {
                config,
                session,
                client,
                auth,
                search,
                store: Arc::new(ShelfStore::new()),
            }),
        })
    }

    pub fn config(&self) -> &ShelfConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn store(&self) -> &Arc<ShelfStore> {
        &self.inner.store
    }

    pub fn client(&self) -> &ShelfClient {
        &self.inner.client
    }

    // ── Hooks ────────────────────────────────────────────────────────

    pub fn collections(&self) -> CollectionsHandle {
        CollectionsHandle::new(
            self.inner.client.clone(),
            Arc::clone(&self.inner.store),
            self.inner.config.cache,
        )
    }

    pub fn entries(&self, collection_id: i64) -> EntriesHandle {
        EntriesHandle::new(
            self.inner.client.clone(),
            Arc::clone(&self.inner.store),
            self.inner.config.cache,
            collection_id,
        )
    }

    pub fn library(&self) -> LibraryHandle {
        LibraryHandle::new(
            self.inner.client.clone(),
            Arc::clone(&self.inner.store),
            self.inner.config.cache,
            self.collections(),
        )
    }

    pub fn account(&self) -> Account {
        Account::new(
            self.inner.auth.clone(),
            Arc::clone(&self.inner.session),
            Arc::clone(&self.inner.store),
        )
    }

    pub fn search(&self) -> SearchHandle {
        SearchHandle::new(
            self.inner.search.clone(),
            Arc::clone(&self.inner.store),
            self.inner.config.cache,
        )
    }
}
