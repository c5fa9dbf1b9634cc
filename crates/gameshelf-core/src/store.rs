// ── Shared client-side state ──
//
// One query cache per record shape plus the mutation boards for the
// two mutable lists. Handles vended by `Shelf` all point at the same
// `ShelfStore`, so a write through one handle is seen by every other.

use gameshelf_api::{Collection, CollectionEntry, Game};

use crate::cache::QueryCache;
use crate::model::CountMap;
use crate::optimistic::{MutationBoard, ProvisionalIds};

#[derive(Default)]
pub struct ShelfStore {
    pub(crate) collections: QueryCache<Vec<Collection>>,
    pub(crate) collection: QueryCache<Collection>,
    pub(crate) entries: QueryCache<Vec<CollectionEntry>>,
    pub(crate) counts: QueryCache<CountMap>,
    pub(crate) games: QueryCache<Vec<Game>>,
    pub(crate) collection_mutations: MutationBoard<Collection>,
    pub(crate) entry_mutations: MutationBoard<CollectionEntry>,
    pub(crate) ids: ProvisionalIds,
}

impl ShelfStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached query, e.g. after the user changes.
    pub fn clear(&self) {
        self.collections.clear();
        self.collection.clear();
        self.entries.clear();
        self.counts.clear();
        self.games.clear();
    }

    /// Evict cache entries nobody is subscribed to, and mutation
    /// bookkeeping for keys with nothing in flight.
    pub fn prune(&self) -> usize {
        self.collections.prune()
            + self.collection.prune()
            + self.entries.prune()
            + self.counts.prune()
            + self.games.prune()
            + self.collection_mutations.prune()
            + self.entry_mutations.prune()
    }
}
