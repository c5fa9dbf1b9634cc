// ── Keyed query cache ──
//
// One `watch` channel per key holds the latest `CacheEntry`. Reads are
// served from the entry while it is fresh; a refetch flips
// `is_validating`, and any caller that arrives while a fetch for the same
// key is in flight waits for that fetch instead of starting another one.
// Local writes (optimistic updates, rollbacks) go through `mutate_local`,
// which reads and writes the entry under the channel lock.

mod stream;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::trace;

use crate::error::CoreError;

pub use stream::{CacheStream, CacheWatchStream};

/// State of one cached query.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Last good value, kept while a refetch is running or after one fails.
    pub data: Option<T>,
    /// Error from the most recent fetch; cleared by the next success.
    pub error: Option<CoreError>,
    pub is_validating: bool,
    /// When `data` last came from the server. `None` means stale.
    pub updated_at: Option<Instant>,
    /// Bumped on every write to `data`.
    pub version: u64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_validating: false,
            updated_at: None,
            version: 0,
        }
    }
}

impl<T> CacheEntry<T> {
    /// First load: nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.is_validating && self.data.is_none()
    }

    fn is_fresh(&self, max_age: Duration) -> bool {
        self.data.is_some() && self.updated_at.is_some_and(|at| at.elapsed() < max_age)
    }
}

/// Outcome of a [`QueryCache::mutate_local`] closure.
#[derive(Debug)]
pub enum LocalWrite<T> {
    Keep,
    Set(T),
    /// Drop the data and mark the key stale.
    Clear,
}

type Slot<T> = Arc<watch::Sender<CacheEntry<T>>>;

/// Keyed cache of query results with in-flight deduplication.
pub struct QueryCache<T: Clone + Send + Sync + 'static> {
    slots: DashMap<String, Slot<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Serve `key` from cache if its data is younger than `max_age`,
    /// otherwise fetch (or join the fetch already running).
    pub async fn get_or_fetch<F>(&self, key: &str, max_age: Duration, fetch: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        let slot = self.slot(key);
        {
            let entry = slot.borrow();
            if !entry.is_validating && entry.is_fresh(max_age) {
                if let Some(data) = &entry.data {
                    trace!(key, "cache hit");
                    return Ok(data.clone());
                }
            }
        }
        self.revalidate(key, fetch).await
    }

    /// Fetch `key` regardless of freshness. If a fetch for `key` is
    /// already running, `fetch` is dropped unpolled and the caller gets
    /// that fetch's outcome.
    pub async fn revalidate<F>(&self, key: &str, fetch: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        let slot = self.slot(key);
        let leader = slot.send_if_modified(|entry| {
            if entry.is_validating {
                false
            } else {
                entry.is_validating = true;
                true
            }
        });
        if !leader {
            trace!(key, "joining in-flight fetch");
            return settled(&slot, key).await;
        }

        let _guard = ValidatingGuard { slot: &slot };
        trace!(key, "fetching");
        let result = fetch.await;
        slot.send_modify(|entry| {
            entry.is_validating = false;
            match &result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                    entry.version += 1;
                }
                Err(e) => entry.error = Some(e.clone()),
            }
        });
        result
    }

    pub fn peek(&self, key: &str) -> Option<CacheEntry<T>> {
        self.slots.get(key).map(|slot| slot.borrow().clone())
    }

    pub fn data(&self, key: &str) -> Option<T> {
        self.slots.get(key).and_then(|slot| slot.borrow().data.clone())
    }

    /// Subscribe to every change of `key`, creating the entry if needed.
    pub fn subscribe(&self, key: &str) -> CacheStream<T> {
        CacheStream::new(self.slot(key).subscribe())
    }

    // ── Local writes ─────────────────────────────────────────────────

    /// Read-modify-write `key` without touching the network. `f` sees
    /// the current entry; returns the entry version after the write.
    pub fn mutate_local(&self, key: &str, f: impl FnOnce(&CacheEntry<T>) -> LocalWrite<T>) -> u64 {
        let slot = self.slot(key);
        let mut version = 0;
        slot.send_if_modified(|entry| {
            let changed = match f(entry) {
                LocalWrite::Keep => false,
                LocalWrite::Set(data) => {
                    entry.data = Some(data);
                    true
                }
                LocalWrite::Clear => {
                    entry.data = None;
                    entry.updated_at = None;
                    true
                }
            };
            if changed {
                entry.version += 1;
            }
            version = entry.version;
            changed
        });
        version
    }

    pub fn set_local(&self, key: &str, data: T) -> u64 {
        self.mutate_local(key, |_| LocalWrite::Set(data))
    }

    /// Mark `key` stale so the next read refetches. Data stays visible.
    pub fn invalidate(&self, key: &str) -> bool {
        let Some(slot) = self.slots.get(key).map(|s| Arc::clone(s.value())) else {
            return false;
        };
        slot.send_modify(|entry| entry.updated_at = None);
        true
    }

    /// [`invalidate`](Self::invalidate) every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let matching: Vec<Slot<T>> = self
            .slots
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| Arc::clone(r.value()))
            .collect();
        for slot in &matching {
            slot.send_modify(|entry| entry.updated_at = None);
        }
        trace!(prefix, count = matching.len(), "invalidated");
        matching.len()
    }

    // ── Housekeeping ─────────────────────────────────────────────────

    /// Drop entries nobody is watching or fetching. Returns how many
    /// were removed.
    pub fn prune(&self) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.receiver_count() > 0 || Arc::strong_count(slot) > 1 || slot.borrow().is_validating);
        before - self.slots.len()
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.slots
            .remove(key)
            .and_then(|(_, slot)| slot.borrow().data.clone())
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn keys(&self) -> Vec<String> {
        self.slots.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: &str) -> Slot<T> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        let entry = self
            .slots
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(watch::channel(CacheEntry::default()).0));
        Arc::clone(entry.value())
    }
}

/// Wait for the running fetch on `slot` to finish and report its result.
async fn settled<T: Clone>(slot: &watch::Sender<CacheEntry<T>>, key: &str) -> Result<T, CoreError> {
    let mut rx = slot.subscribe();
    let (data, error) = rx
        .wait_for(|entry| !entry.is_validating)
        .await
        .map(|entry| (entry.data.clone(), entry.error.clone()))
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    match (error, data) {
        (Some(e), _) => Err(e),
        (None, Some(data)) => Ok(data),
        (None, None) => Err(CoreError::Internal(format!("fetch for {key} was cancelled"))),
    }
}

/// Clears `is_validating` if the leading fetch is dropped mid-flight, so
/// waiters are released.
struct ValidatingGuard<'a, T> {
    slot: &'a watch::Sender<CacheEntry<T>>,
}

impl<T> Drop for ValidatingGuard<'_, T> {
    fn drop(&mut self) {
        self.slot
            .send_if_modified(|entry| std::mem::replace(&mut entry.is_validating, false));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    fn counted(calls: &AtomicUsize, value: u32) -> impl Future<Output = Result<u32, CoreError>> + '_ {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_fetching() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(2);

        assert_eq!(cache.get_or_fetch("k", ttl, counted(&calls, 1)).await.unwrap(), 1);
        assert_eq!(cache.get_or_fetch("k", ttl, counted(&calls, 2)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_refetches() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(2);

        cache.get_or_fetch("k", ttl, counted(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(cache.get_or_fetch("k", ttl, counted(&calls, 2)).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let (tx, rx) = oneshot::channel::<u32>();

        let slow = async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(rx.await.unwrap())
        };
        let first = cache.revalidate("k", slow);
        let second = cache.revalidate("k", counted(&calls, 99));
        let release = async {
            tokio::task::yield_now().await;
            tx.send(7).unwrap();
        };

        let (a, b, ()) = futures::join!(first, second, release);
        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let cache = QueryCache::new();
        cache.set_local("k", 5u32);

        let err = cache
            .revalidate("k", async { Err(CoreError::Internal("boom".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Internal("boom".into()));

        let entry = cache.peek("k").unwrap();
        assert_eq!(entry.data, Some(5));
        assert_eq!(entry.error, Some(CoreError::Internal("boom".into())));
        assert!(!entry.is_validating);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_but_keeps_data() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);

        cache.get_or_fetch("/counts-1", ttl, counted(&calls, 1)).await.unwrap();
        cache.get_or_fetch("/counts-2", ttl, counted(&calls, 1)).await.unwrap();
        assert_eq!(cache.invalidate_prefix("/counts-"), 2);
        assert_eq!(cache.data("/counts-1"), Some(1));

        cache.get_or_fetch("/counts-1", ttl, counted(&calls, 3)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn mutate_local_reports_version() {
        let cache: QueryCache<Vec<i64>> = QueryCache::new();
        assert_eq!(cache.mutate_local("k", |_| LocalWrite::Keep), 0);
        assert_eq!(cache.set_local("k", vec![1]), 1);
        let v = cache.mutate_local("k", |entry| {
            let mut list = entry.data.clone().unwrap_or_default();
            list.push(2);
            LocalWrite::Set(list)
        });
        assert_eq!(v, 2);
        assert_eq!(cache.data("k"), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn subscribers_see_local_writes() {
        let cache: QueryCache<u32> = QueryCache::new();
        let mut stream = cache.subscribe("k");
        cache.set_local("k", 3);
        let entry = stream.changed().await.unwrap();
        assert_eq!(entry.data, Some(3));
    }

    #[tokio::test]
    async fn stream_yields_current_then_each_write() {
        use tokio_stream::StreamExt;

        let cache: QueryCache<u32> = QueryCache::new();
        cache.set_local("k", 1);
        let mut stream = cache.subscribe("k").into_stream();

        assert_eq!(stream.next().await.unwrap().data, Some(1));
        cache.set_local("k", 2);
        assert_eq!(stream.next().await.unwrap().data, Some(2));

        cache.remove("k");
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn prune_drops_unwatched_entries() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.set_local("watched", 1);
        cache.set_local("idle", 2);
        let _stream = cache.subscribe("watched");

        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.keys(), vec!["watched".to_owned()]);
    }
}
