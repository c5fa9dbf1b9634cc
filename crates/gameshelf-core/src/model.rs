// ── Domain model ──
//
// Wire types come straight from `gameshelf-api`. This module adds what
// the cache layer needs on top: a stable id per record, in-place patch
// merging, the derived collection-with-count view, and cache keys.

use std::collections::BTreeMap;

use serde::Serialize;

pub use gameshelf_api::{
    Collection, CollectionEntry, CreateCollectionRequest, CreateEntryRequest, Game, UpdateCollectionRequest,
    UpdateEntryRequest, UserProfile,
};

/// A record that lives in a cached list and can be patched locally.
pub trait Resource: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Partial update accepted by the server for this record type.
    type Patch: Clone + std::fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> i64;

    /// Apply the fields present in `patch`, leaving the rest untouched.
    fn merge(&self, patch: &Self::Patch) -> Self;
}

impl Resource for Collection {
    type Patch = UpdateCollectionRequest;

    fn id(&self) -> i64 {
        self.id
    }

    fn merge(&self, patch: &UpdateCollectionRequest) -> Self {
        Self {
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            ..self.clone()
        }
    }
}

impl Resource for CollectionEntry {
    type Patch = UpdateEntryRequest;

    fn id(&self) -> i64 {
        self.id
    }

    fn merge(&self, patch: &UpdateEntryRequest) -> Self {
        Self {
            notes: patch.notes.clone().or_else(|| self.notes.clone()),
            status: patch.status.clone().or_else(|| self.status.clone()),
            rating: patch.rating.or(self.rating),
            custom_tags: patch.custom_tags.clone().or_else(|| self.custom_tags.clone()),
            ..self.clone()
        }
    }
}

/// Game count per collection id.
pub type CountMap = BTreeMap<i64, usize>;

/// A collection joined with the number of entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionWithCount {
    #[serde(flatten)]
    pub collection: Collection,
    pub game_count: usize,
}

// ── Cache keys ──────────────────────────────────────────────────────

pub const COLLECTIONS_KEY: &str = "/collections";
pub const COUNTS_KEY_PREFIX: &str = "/collections-counts-";

pub fn collection_key(id: i64) -> String {
    format!("/collections/{id}")
}

pub fn entries_key(collection_id: i64) -> String {
    format!("/collections/{collection_id}/entries")
}

pub fn search_key(query: &str) -> String {
    format!("/igdb/search?q={query}")
}

/// Key for the derived count map over `ids`. Order of `ids` does not
/// matter; the same set always yields the same key.
pub fn counts_key(ids: impl IntoIterator<Item = i64>) -> String {
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    let joined: Vec<String> = ids.iter().map(i64::to_string).collect();
    format!("{COUNTS_KEY_PREFIX}{}", joined.join("-"))
}
