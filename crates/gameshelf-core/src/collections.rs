// ── Collections hook ──
//
// Cached list of the user's collections with optimistic create, update,
// and delete. Single collections are cached under their own key.

use std::sync::Arc;

use gameshelf_api::{Collection, CreateCollectionRequest, ShelfClient, UpdateCollectionRequest};
use tracing::debug;

use crate::cache::{CacheEntry, CacheStream};
use crate::config::CachePolicy;
use crate::error::CoreError;
use crate::model::{COLLECTIONS_KEY, COUNTS_KEY_PREFIX, collection_key, entries_key};
use crate::optimistic::{MutationState, OptimisticList};
use crate::store::ShelfStore;

#[derive(Clone)]
pub struct CollectionsHandle {
    client: ShelfClient,
    store: Arc<ShelfStore>,
    policy: CachePolicy,
}

impl CollectionsHandle {
    pub(crate) fn new(client: ShelfClient, store: Arc<ShelfStore>, policy: CachePolicy) -> Self {
        Self {
            client,
            store,
            policy,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Cached list, refetched once older than the dedupe interval.
    pub async fn list(&self) -> Result<Vec<Collection>, CoreError> {
        self.store
            .collections
            .get_or_fetch(COLLECTIONS_KEY, self.policy.dedupe_interval, self.fetch_all())
            .await
    }

    pub async fn refresh(&self) -> Result<Vec<Collection>, CoreError> {
        self.store
            .collections
            .revalidate(COLLECTIONS_KEY, self.fetch_all())
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Collection, CoreError> {
        let client = &self.client;
        self.store
            .collection
            .get_or_fetch(&collection_key(id), self.policy.dedupe_interval, async move {
                client.get_collection(id).await.map_err(CoreError::from)
            })
            .await
    }

    /// Current list without touching the network. Empty until loaded.
    pub fn snapshot(&self) -> Vec<Collection> {
        self.store.collections.data(COLLECTIONS_KEY).unwrap_or_default()
    }

    pub fn state(&self) -> CacheEntry<Vec<Collection>> {
        self.store.collections.peek(COLLECTIONS_KEY).unwrap_or_default()
    }

    pub fn subscribe(&self) -> CacheStream<Vec<Collection>> {
        self.store.collections.subscribe(COLLECTIONS_KEY)
    }

    pub fn mutation_state(&self) -> MutationState {
        self.store.collection_mutations.state(COLLECTIONS_KEY)
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create(&self, request: CreateCollectionRequest) -> Result<Collection, CoreError> {
        let provisional = |id| Collection {
            id,
            user_id: 0,
            name: request.name.clone(),
            description: request.description.clone().unwrap_or_default(),
        };
        let client = &self.client;
        let remote = async { client.create_collection(&request).await.map_err(CoreError::from) };

        let created = self.list_ops().create(provisional, remote).await?;
        self.store.collection.set_local(&collection_key(created.id), created.clone());
        Ok(created)
    }

    pub async fn update(&self, id: i64, request: UpdateCollectionRequest) -> Result<Collection, CoreError> {
        let client = &self.client;
        let body = request.clone();
        let updated = self
            .list_ops()
            .update(id, request, |target| async move {
                client.update_collection(target, &body).await.map_err(CoreError::from)
            })
            .await?;
        self.store.collection.set_local(&collection_key(updated.id), updated.clone());
        Ok(updated)
    }

    /// Delete a collection. Its entries and the derived counts go stale.
    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        let client = &self.client;
        self.list_ops()
            .delete(id, |target| async move { client.delete_collection(target).await.map_err(CoreError::from) })
            .await?;

        self.store.collection.remove(&collection_key(id));
        self.store.entries.remove(&entries_key(id));
        self.store.counts.invalidate_prefix(COUNTS_KEY_PREFIX);
        debug!(id, "collection deleted");
        Ok(())
    }

    fn list_ops(&self) -> OptimisticList<'_, Collection> {
        OptimisticList::new(
            &self.store.collections,
            &self.store.collection_mutations,
            &self.store.ids,
            COLLECTIONS_KEY,
            "collection",
        )
    }

    async fn fetch_all(&self) -> Result<Vec<Collection>, CoreError> {
        Ok(self.client.list_collections().await?)
    }
}
