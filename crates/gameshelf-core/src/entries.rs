// ── Collection entries hook ──
//
// Same cache-and-mutate contract as collections, scoped to one
// collection. Adding or removing an entry changes that collection's
// game count, so those mutations invalidate the derived counts.

use std::sync::Arc;

use gameshelf_api::{CollectionEntry, CreateEntryRequest, ShelfClient, UpdateEntryRequest};

use crate::cache::{CacheEntry, CacheStream};
use crate::config::CachePolicy;
use crate::error::CoreError;
use crate::model::{COUNTS_KEY_PREFIX, entries_key};
use crate::optimistic::{MutationState, OptimisticList};
use crate::store::ShelfStore;

#[derive(Clone)]
pub struct EntriesHandle {
    client: ShelfClient,
    store: Arc<ShelfStore>,
    policy: CachePolicy,
    collection_id: i64,
    key: String,
}

impl EntriesHandle {
    pub(crate) fn new(client: ShelfClient, store: Arc<ShelfStore>, policy: CachePolicy, collection_id: i64) -> Self {
        Self {
            client,
            store,
            policy,
            collection_id,
            key: entries_key(collection_id),
        }
    }

    pub fn collection_id(&self) -> i64 {
        self.collection_id
    }

    pub async fn list(&self) -> Result<Vec<CollectionEntry>, CoreError> {
        self.store
            .entries
            .get_or_fetch(&self.key, self.policy.dedupe_interval, self.fetch_all())
            .await
    }

    pub async fn refresh(&self) -> Result<Vec<CollectionEntry>, CoreError> {
        self.store.entries.revalidate(&self.key, self.fetch_all()).await
    }

    pub fn snapshot(&self) -> Vec<CollectionEntry> {
        self.store.entries.data(&self.key).unwrap_or_default()
    }

    pub fn state(&self) -> CacheEntry<Vec<CollectionEntry>> {
        self.store.entries.peek(&self.key).unwrap_or_default()
    }

    pub fn subscribe(&self) -> CacheStream<Vec<CollectionEntry>> {
        self.store.entries.subscribe(&self.key)
    }

    pub fn mutation_state(&self) -> MutationState {
        self.store.entry_mutations.state(&self.key)
    }

    /// Add a game to the collection.
    pub async fn add(&self, request: CreateEntryRequest) -> Result<CollectionEntry, CoreError> {
        let collection_id = self.collection_id;
        let provisional = |id| CollectionEntry {
            id,
            collection_id,
            game_id: request.game_id,
            notes: request.notes.clone(),
            status: request.status.clone(),
            rating: request.rating,
            custom_tags: request.custom_tags.clone(),
            added_at: Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
            game: None,
        };
        let client = &self.client;
        let remote = async { client.create_entry(collection_id, &request).await.map_err(CoreError::from) };

        let created = self.list_ops().create(provisional, remote).await?;
        self.store.counts.invalidate_prefix(COUNTS_KEY_PREFIX);
        Ok(created)
    }

    pub async fn update(&self, entry_id: i64, request: UpdateEntryRequest) -> Result<CollectionEntry, CoreError> {
        let client = &self.client;
        let collection_id = self.collection_id;
        let body = request.clone();
        self.list_ops()
            .update(entry_id, request, |target| async move {
                client.update_entry(collection_id, target, &body).await.map_err(CoreError::from)
            })
            .await
    }

    pub async fn remove(&self, entry_id: i64) -> Result<(), CoreError> {
        let client = &self.client;
        let collection_id = self.collection_id;
        self.list_ops()
            .delete(entry_id, |target| async move {
                client.delete_entry(collection_id, target).await.map_err(CoreError::from)
            })
            .await?;
        self.store.counts.invalidate_prefix(COUNTS_KEY_PREFIX);
        Ok(())
    }

    fn list_ops(&self) -> OptimisticList<'_, CollectionEntry> {
        OptimisticList::new(
            &self.store.entries,
            &self.store.entry_mutations,
            &self.store.ids,
            self.key.clone(),
            "collection entry",
        )
    }

    async fn fetch_all(&self) -> Result<Vec<CollectionEntry>, CoreError> {
        Ok(self.client.list_entries(self.collection_id).await?)
    }
}
