// ── Cache subscriptions ──
//
// A `CacheStream` follows one key of a `QueryCache`: its data, error,
// and validating flag.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::CacheEntry;

/// A subscription to one cache key.
pub struct CacheStream<T: Clone + Send + Sync + 'static> {
    current: CacheEntry<T>,
    receiver: watch::Receiver<CacheEntry<T>>,
}

impl<T: Clone + Send + Sync + 'static> CacheStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<CacheEntry<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Entry captured at creation time or at the last `changed()`.
    pub fn current(&self) -> &CacheEntry<T> {
        &self.current
    }

    pub fn latest(&self) -> CacheEntry<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the cache entry is gone.
    pub async fn changed(&mut self) -> Option<CacheEntry<T>> {
        self.receiver.changed().await.ok()?;
        let entry = self.receiver.borrow_and_update().clone();
        self.current = entry.clone();
        Some(entry)
    }

    pub fn into_stream(self) -> CacheWatchStream<T> {
        CacheWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new [`CacheEntry`].
pub struct CacheWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<CacheEntry<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for CacheWatchStream<T> {
    type Item = CacheEntry<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
