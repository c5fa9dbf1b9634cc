// ── Optimistic list mutations ──
//
// Create, update, and delete against a cached list: the local list
// changes first, the remote call runs second, and the outcome either
// commits the server's record or rolls the list back. Each list key has
// a `KeyMutations` record on the `MutationBoard` tracking in-flight
// work, provisional ids still waiting for their server id, and
// provisional records deleted before their create returned.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::{DashMap, DashSet};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{LocalWrite, QueryCache};
use crate::error::CoreError;
use crate::model::Resource;

// ── Phase machine ────────────────────────────────────────────────────

/// Where the mutations on one list key stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    /// Local change applied, remote call outstanding.
    OptimisticPending,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Begin,
    Commit,
    Rollback,
}

/// Phase plus the number of mutations still waiting on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationState {
    pub phase: MutationPhase,
    pub in_flight: usize,
}

impl MutationState {
    /// Pure transition. The key stays `OptimisticPending` until the last
    /// outstanding mutation settles.
    #[must_use]
    pub fn apply(self, event: PhaseEvent) -> Self {
        match event {
            PhaseEvent::Begin => Self {
                phase: MutationPhase::OptimisticPending,
                in_flight: self.in_flight + 1,
            },
            PhaseEvent::Commit | PhaseEvent::Rollback => {
                let in_flight = self.in_flight.saturating_sub(1);
                let phase = match (in_flight, event) {
                    (0, PhaseEvent::Commit) => MutationPhase::Committed,
                    (0, _) => MutationPhase::RolledBack,
                    _ => MutationPhase::OptimisticPending,
                };
                Self { phase, in_flight }
            }
        }
    }
}

// ── List reducer ─────────────────────────────────────────────────────

/// A change to a cached list.
#[derive(Debug, Clone)]
pub enum ListAction<T: Resource> {
    /// Add at the end, or replace in place if the id is already present.
    Append(T),
    /// Put `record` back at `index` (clamped), or replace in place.
    Insert { index: usize, record: T },
    Merge { id: i64, patch: T::Patch },
    Replace { id: i64, record: T },
    /// Drop the provisional record and append the server's version.
    SwapProvisional { temp_id: i64, record: T },
    Remove { id: i64 },
}

/// Apply `action` to `list`, returning the new list.
pub fn reduce<T: Resource>(list: &[T], action: &ListAction<T>) -> Vec<T> {
    let mut next = list.to_vec();
    match action {
        ListAction::Append(record) => upsert(&mut next, record.clone(), None),
        ListAction::Insert { index, record } => upsert(&mut next, record.clone(), Some(*index)),
        ListAction::Merge { id, patch } => {
            if let Some(slot) = next.iter_mut().find(|r| r.id() == *id) {
                *slot = slot.merge(patch);
            }
        }
        ListAction::Replace { id, record } => {
            if let Some(slot) = next.iter_mut().find(|r| r.id() == *id) {
                *slot = record.clone();
            }
        }
        ListAction::SwapProvisional { temp_id, record } => {
            next.retain(|r| r.id() != *temp_id);
            upsert(&mut next, record.clone(), None);
        }
        ListAction::Remove { id } => next.retain(|r| r.id() != *id),
    }
    next
}

fn upsert<T: Resource>(list: &mut Vec<T>, record: T, index: Option<usize>) {
    if let Some(slot) = list.iter_mut().find(|r| r.id() == record.id()) {
        *slot = record;
        return;
    }
    match index {
        Some(i) => list.insert(i.min(list.len()), record),
        None => list.push(record),
    }
}

// ── Provisional ids ──────────────────────────────────────────────────

/// Hands out negative ids for records the server has not numbered yet.
///
/// Derived from the wall clock in milliseconds, but strictly monotonic:
/// two calls in the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct ProvisionalIds {
    last: AtomicI64,
}

impl ProvisionalIds {
    pub fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        -now.max(prev + 1)
    }
}

/// Server ids are positive; provisional ids are negative.
pub fn is_provisional(id: i64) -> bool {
    id < 0
}

// ── Per-key bookkeeping ──────────────────────────────────────────────

#[derive(Debug, Clone)]
enum CreateStatus<T> {
    InFlight,
    Confirmed(T),
    Failed,
}

struct KeyMutations<T: Resource> {
    state: watch::Sender<MutationState>,
    /// Creates whose remote call has not returned, by provisional id.
    /// Anyone who must act on a provisional id subscribes here; the
    /// entry is removed as soon as the create settles.
    creates: DashMap<i64, Arc<watch::Sender<CreateStatus<T>>>>,
    /// Provisional ids deleted before their create returned.
    tombstones: DashSet<i64>,
}

impl<T: Resource> KeyMutations<T> {
    fn new() -> Self {
        Self {
            state: watch::channel(MutationState::default()).0,
            creates: DashMap::new(),
            tombstones: DashSet::new(),
        }
    }

    fn transition(&self, event: PhaseEvent) {
        self.state.send_modify(|s| *s = s.apply(event));
    }

    fn register_create(&self, temp_id: i64) {
        self.creates
            .insert(temp_id, Arc::new(watch::channel(CreateStatus::InFlight).0));
    }

    /// Publish the outcome of a create to everyone waiting on it.
    fn settle_create(&self, temp_id: i64, saved: Option<T>) {
        let status = saved.map_or(CreateStatus::Failed, CreateStatus::Confirmed);
        if let Some((_, sender)) = self.creates.remove(&temp_id) {
            sender.send_replace(status);
        }
    }

    /// Server identity behind `id`, waiting for its create if needed.
    async fn resolve(&self, id: i64) -> Resolution<T> {
        if !is_provisional(id) {
            return Resolution::Saved { id, record: None };
        }
        let Some(sender) = self.creates.get(&id).map(|s| Arc::clone(s.value())) else {
            return Resolution::Unknown;
        };
        let mut rx = sender.subscribe();
        let status = rx
            .wait_for(|s| !matches!(s, CreateStatus::InFlight))
            .await
            .map(|s| s.clone());
        match status {
            Ok(CreateStatus::Confirmed(record)) => Resolution::Saved {
                id: record.id(),
                record: Some(record),
            },
            _ => Resolution::Failed,
        }
    }

    fn is_idle(&self) -> bool {
        self.state.receiver_count() == 0
            && self.state.borrow().in_flight == 0
            && self.creates.is_empty()
            && self.tombstones.is_empty()
    }
}

enum Resolution<T> {
    /// Server id, plus the confirmed record when the id was provisional.
    Saved { id: i64, record: Option<T> },
    /// The create behind a provisional id failed.
    Failed,
    /// A provisional id with no pending create: already settled, or never
    /// handed out.
    Unknown,
}

/// Marks a create as failed if its future is dropped before settling.
struct CreateTicket<'a, T: Resource> {
    mutations: &'a KeyMutations<T>,
    temp_id: i64,
    settled: bool,
}

impl<T: Resource> CreateTicket<'_, T> {
    fn settle(mut self, saved: Option<T>) {
        self.settled = true;
        self.mutations.settle_create(self.temp_id, saved);
    }
}

impl<T: Resource> Drop for CreateTicket<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.mutations.settle_create(self.temp_id, None);
            self.mutations.transition(PhaseEvent::Rollback);
        }
    }
}

/// Mutation bookkeeping for every list key of one record type.
pub struct MutationBoard<T: Resource> {
    keys: DashMap<String, Arc<KeyMutations<T>>>,
}

impl<T: Resource> Default for MutationBoard<T> {
    fn default() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }
}

impl<T: Resource> MutationBoard<T> {
    pub fn state(&self, key: &str) -> MutationState {
        self.keys
            .get(key)
            .map(|m| *m.state.borrow())
            .unwrap_or_default()
    }

    pub fn subscribe(&self, key: &str) -> watch::Receiver<MutationState> {
        self.mutations(key).state.subscribe()
    }

    /// Forget keys with nothing in flight and nobody watching. Their
    /// phase reads as `Idle` afterwards.
    pub fn prune(&self) -> usize {
        let before = self.keys.len();
        self.keys.retain(|_, m| Arc::strong_count(m) > 1 || !m.is_idle());
        before - self.keys.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn mutations(&self, key: &str) -> Arc<KeyMutations<T>> {
        if let Some(m) = self.keys.get(key) {
            return Arc::clone(m.value());
        }
        Arc::clone(
            self.keys
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(KeyMutations::new()))
                .value(),
        )
    }
}

// ── OptimisticList ───────────────────────────────────────────────────

struct Snapshot<T> {
    before: Option<Vec<T>>,
    version: u64,
}

/// Optimistic mutations against the list cached under one key.
pub struct OptimisticList<'a, T: Resource> {
    cache: &'a QueryCache<Vec<T>>,
    board: &'a MutationBoard<T>,
    ids: &'a ProvisionalIds,
    key: String,
    resource: &'static str,
}

impl<'a, T: Resource> OptimisticList<'a, T> {
    pub fn new(
        cache: &'a QueryCache<Vec<T>>,
        board: &'a MutationBoard<T>,
        ids: &'a ProvisionalIds,
        key: impl Into<String>,
        resource: &'static str,
    ) -> Self {
        Self {
            cache,
            board,
            ids,
            key: key.into(),
            resource,
        }
    }

    /// Append a provisional record built by `build` from a fresh
    /// negative id, then run `remote`. On success the provisional record
    /// is swapped for the server's; on failure the list is rolled back.
    pub async fn create<F>(&self, build: impl FnOnce(i64) -> T, remote: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        let mutations = self.board.mutations(&self.key);
        let temp_id = self.ids.next();
        mutations.register_create(temp_id);
        let ticket = CreateTicket {
            mutations: &mutations,
            temp_id,
            settled: false,
        };

        let snapshot = self.apply(&ListAction::Append(build(temp_id)));
        mutations.transition(PhaseEvent::Begin);
        debug!(key = %self.key, temp_id, "optimistic create of {}", self.resource);

        match remote.await {
            Ok(saved) => {
                if mutations.tombstones.remove(&temp_id).is_some() {
                    debug!(key = %self.key, temp_id, "{} deleted while its create was pending", self.resource);
                    self.apply(&ListAction::Remove { id: temp_id });
                } else {
                    self.apply(&ListAction::SwapProvisional {
                        temp_id,
                        record: saved.clone(),
                    });
                }
                ticket.settle(Some(saved.clone()));
                mutations.transition(PhaseEvent::Commit);
                Ok(saved)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "create {} failed, rolling back", self.resource);
                self.rollback(Some(snapshot), Some(ListAction::Remove { id: temp_id }));
                ticket.settle(None);
                mutations.transition(PhaseEvent::Rollback);
                Err(e)
            }
        }
    }

    /// Merge `patch` into record `id`, then run `remote` with the server
    /// id. The server's record replaces the merged one on success.
    pub async fn update<F, Fut>(&self, id: i64, patch: T::Patch, remote: F) -> Result<T, CoreError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mutations = self.board.mutations(&self.key);
        let snapshot = self.apply(&ListAction::Merge { id, patch });
        let original = snapshot
            .before
            .as_ref()
            .and_then(|list| list.iter().find(|r| r.id() == id).cloned());
        mutations.transition(PhaseEvent::Begin);
        debug!(key = %self.key, id, "optimistic update of {}", self.resource);

        let result = match mutations.resolve(id).await {
            Resolution::Saved { id: target, .. } => remote(target).await,
            Resolution::Failed | Resolution::Unknown => Err(CoreError::NotFound {
                resource: self.resource,
                id,
            }),
        };

        match result {
            Ok(saved) => {
                self.apply(&ListAction::Replace {
                    id: saved.id(),
                    record: saved.clone(),
                });
                mutations.transition(PhaseEvent::Commit);
                Ok(saved)
            }
            Err(e) => {
                warn!(key = %self.key, id, error = %e, "update {} failed, rolling back", self.resource);
                let inverse = original.map(|record| ListAction::Replace { id, record });
                self.rollback(Some(snapshot), inverse);
                mutations.transition(PhaseEvent::Rollback);
                Err(e)
            }
        }
    }

    /// Remove record `id`, then run `remote` with the server id.
    ///
    /// Deleting a provisional record waits for its create: if the create
    /// fails there is nothing to delete remotely; if it succeeds the
    /// server record is deleted and never shown. A provisional id whose
    /// create already settled is `NotFound`.
    pub async fn delete<F, Fut>(&self, id: i64, remote: F) -> Result<(), CoreError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let mutations = self.board.mutations(&self.key);
        if is_provisional(id) {
            mutations.tombstones.insert(id);
        }
        let snapshot = self.apply(&ListAction::Remove { id });
        let removed = snapshot.before.as_ref().and_then(|list| {
            list.iter()
                .position(|r| r.id() == id)
                .map(|index| (index, list[index].clone()))
        });
        mutations.transition(PhaseEvent::Begin);
        debug!(key = %self.key, id, "optimistic delete of {}", self.resource);

        let (target, snapshot, restore) = if is_provisional(id) {
            let resolution = mutations.resolve(id).await;
            mutations.tombstones.remove(&id);
            match resolution {
                Resolution::Saved { id: server_id, record } => {
                    self.apply(&ListAction::Remove { id: server_id });
                    let index = removed.map_or(usize::MAX, |(index, _)| index);
                    let restore = record.map(|record| (index, record));
                    // The list changed under us; only the inverse is safe now.
                    (server_id, None, restore)
                }
                Resolution::Failed => {
                    debug!(key = %self.key, id, "provisional {} never reached the server", self.resource);
                    mutations.transition(PhaseEvent::Commit);
                    return Ok(());
                }
                Resolution::Unknown => {
                    warn!(key = %self.key, id, "no pending create for provisional {}", self.resource);
                    self.rollback(Some(snapshot), removed.map(|(index, record)| ListAction::Insert { index, record }));
                    mutations.transition(PhaseEvent::Rollback);
                    return Err(CoreError::NotFound {
                        resource: self.resource,
                        id,
                    });
                }
            }
        } else {
            (id, Some(snapshot), removed)
        };

        match remote(target).await {
            Ok(()) => {
                mutations.transition(PhaseEvent::Commit);
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, id = target, error = %e, "delete {} failed, rolling back", self.resource);
                let inverse = restore.map(|(index, record)| ListAction::Insert { index, record });
                self.rollback(snapshot, inverse);
                mutations.transition(PhaseEvent::Rollback);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> MutationState {
        self.board.state(&self.key)
    }

    fn apply(&self, action: &ListAction<T>) -> Snapshot<T> {
        let mut before = None;
        let version = self.cache.mutate_local(&self.key, |entry| {
            before.clone_from(&entry.data);
            let current = entry.data.as_deref().unwrap_or_default();
            LocalWrite::Set(reduce(current, action))
        });
        Snapshot { before, version }
    }

    /// Put back the captured list if nothing else wrote since, otherwise
    /// undo only this mutation.
    fn rollback(&self, snapshot: Option<Snapshot<T>>, inverse: Option<ListAction<T>>) {
        self.cache.mutate_local(&self.key, |entry| match snapshot {
            Some(snap) if snap.version == entry.version => match snap.before {
                Some(list) => LocalWrite::Set(list),
                None => LocalWrite::Clear,
            },
            _ => match &inverse {
                Some(action) => {
                    LocalWrite::Set(reduce(entry.data.as_deref().unwrap_or_default(), action))
                }
                None => LocalWrite::Keep,
            },
        });
    }
}
