// ── Collections with game counts ──
//
// Joins the cached collection list with a count map built by fetching
// every collection's entries in parallel. The count map is cached under
// a key derived from the set of collection ids, so adding or removing a
// collection starts a new map while an unchanged set reuses the old one.

use std::sync::Arc;

use futures::future::join_all;
use gameshelf_api::{Collection, ShelfClient};
use tracing::{debug, warn};

use crate::cache::LocalWrite;
use crate::collections::CollectionsHandle;
use crate::config::CachePolicy;
use crate::error::CoreError;
use crate::model::{COUNTS_KEY_PREFIX, CollectionWithCount, CountMap, counts_key};
use crate::optimistic::is_provisional;
use crate::store::ShelfStore;

/// Ids of collections the server knows about. Collections still being
/// created have no entries endpoint yet and count as zero.
fn server_ids(collections: &[Collection]) -> Vec<i64> {
    collections.iter().map(|c| c.id).filter(|&id| !is_provisional(id)).collect()
}

/// What a library screen renders.
#[derive(Debug, Clone, Default)]
pub struct LibraryView {
    pub collections: Vec<CollectionWithCount>,
    /// True while either the list or the counts have nothing to show yet.
    pub is_loading: bool,
    /// The list error if there is one, otherwise the counts error.
    pub error: Option<CoreError>,
}

#[derive(Clone)]
pub struct LibraryHandle {
    client: ShelfClient,
    store: Arc<ShelfStore>,
    policy: CachePolicy,
    collections: CollectionsHandle,
}

impl LibraryHandle {
    pub(crate) fn new(
        client: ShelfClient,
        store: Arc<ShelfStore>,
        policy: CachePolicy,
        collections: CollectionsHandle,
    ) -> Self {
        Self {
            client,
            store,
            policy,
            collections,
        }
    }

    pub fn collections(&self) -> &CollectionsHandle {
        &self.collections
    }

    /// Load the list and the counts (each from cache when fresh) and
    /// return the joined view. Failures end up in `LibraryView::error`.
    pub async fn load(&self) -> LibraryView {
        if let Err(e) = self.collections.list().await {
            debug!(error = %e, "collection list unavailable");
        }

        let ids = server_ids(&self.collections.snapshot());
        if !ids.is_empty() {
            let key = counts_key(ids.iter().copied());
            let fetch = self.fetch_counts(ids);
            if let Err(e) = self
                .store
                .counts
                .get_or_fetch(&key, self.policy.counts_dedupe_interval, fetch)
                .await
            {
                debug!(error = %e, "collection counts unavailable");
            }
        }
        self.view()
    }

    /// Refetch the list and recompute every count.
    pub async fn refresh(&self) -> LibraryView {
        if let Err(e) = self.collections.refresh().await {
            debug!(error = %e, "collection list refresh failed");
        }
        self.store.counts.invalidate_prefix(COUNTS_KEY_PREFIX);
        self.load().await
    }

    /// Join whatever is cached right now, without any network.
    pub fn view(&self) -> LibraryView {
        let list = self.collections.state();
        let collections = list.data.clone().unwrap_or_default();
        let ids = server_ids(&collections);
        let counts = if ids.is_empty() {
            None
        } else {
            self.store.counts.peek(&counts_key(ids))
        };
        let map = counts.as_ref().and_then(|c| c.data.as_ref());

        let joined = collections
            .into_iter()
            .map(|collection| CollectionWithCount {
                game_count: map.and_then(|m| m.get(&collection.id).copied()).unwrap_or(0),
                collection,
            })
            .collect();

        LibraryView {
            collections: joined,
            is_loading: list.is_loading() || counts.as_ref().is_some_and(|c| c.is_loading()),
            error: list.error.clone().or_else(|| counts.and_then(|c| c.error)),
        }
    }

    /// Recount one collection and patch the cached map in place.
    /// Returns the new count, or `None` if the fetch failed.
    pub async fn update_collection_count(&self, collection_id: i64) -> Option<usize> {
        let count = match self.client.list_entries(collection_id).await {
            Ok(entries) => entries.len(),
            Err(e) => {
                warn!(collection_id, error = %e, "failed to update game count");
                return None;
            }
        };
        let key = counts_key(server_ids(&self.collections.snapshot()));
        self.store.counts.mutate_local(&key, |entry| {
            let mut map = entry.data.clone().unwrap_or_default();
            map.insert(collection_id, count);
            LocalWrite::Set(map)
        });
        Some(count)
    }

    /// One entries request per collection, all in flight together. A
    /// failed request counts as zero.
    async fn fetch_counts(&self, ids: Vec<i64>) -> Result<CountMap, CoreError> {
        let requests = ids.into_iter().map(|id| async move {
            match self.client.list_entries(id).await {
                Ok(entries) => (id, entries.len()),
                Err(e) => {
                    warn!(collection_id = id, error = %e, "failed to fetch entries for collection");
                    (id, 0)
                }
            }
        });
        Ok(join_all(requests).await.into_iter().collect())
    }
}
