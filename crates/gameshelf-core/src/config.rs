// ── Runtime configuration ──
//
// Describes which services to talk to and how long cached reads stay
// fresh. Never touches disk: the CLI builds a `ShelfConfig` from its
// profile and hands it in.

use std::time::Duration;

use url::Url;

/// How long a cached read may be served without asking the server again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Window for collections, entries, single collections, and searches.
    pub dedupe_interval: Duration,
    /// Window for the derived per-collection game counts.
    pub counts_dedupe_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            dedupe_interval: Duration::from_secs(2),
            counts_dedupe_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Endpoints and tuning for a [`Shelf`](crate::Shelf).
///
/// The auth and search services are optional: without them, account
/// flows and game search fail with a configuration error while the
/// collection APIs keep working.
#[derive(Debug, Clone)]
pub struct ShelfConfig {
    pub service_url: Url,
    pub auth_url: Option<Url>,
    pub search_url: Option<Url>,
    pub timeout: Duration,
    pub cache: CachePolicy,
}

impl ShelfConfig {
    pub fn new(service_url: Url) -> Self {
        Self {
            service_url,
            auth_url: None,
            search_url: None,
            timeout: Duration::from_secs(30),
            cache: CachePolicy::default(),
        }
    }
}
