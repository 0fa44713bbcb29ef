//! Dashboard cache with TTL expiry and in-flight fetch deduplication.
//!
//! The cache is an explicit, injectable service constructed once per process
//! and shared via `Arc`. It deliberately outlives any single consumer so
//! rapid remount cycles reuse both cached dashboards and fetches that are
//! still in flight, instead of issuing duplicate network calls.

use facet_client::GatewayError;
use facet_core::{Dashboard, DashboardId};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the dashboard cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached dashboard stays fresh.
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Hit rate over all lookups (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    dashboard: Dashboard,
    cached_at: Instant,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Dashboard, GatewayError>>>;

/// Keyed dashboard cache plus in-flight fetch map.
///
/// Mutations to the shared maps happen only at synchronous points between
/// awaits; the mutexes are never held across a suspension.
pub struct DashboardCache {
    config: CacheConfig,
    entries: Mutex<HashMap<DashboardId, CacheEntry>>,
    inflight: Mutex<HashMap<DashboardId, SharedFetch>>,
    stats: Mutex<CacheStats>,
}

impl DashboardCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Fresh cached copy, if any. An expired entry is removed on consultation.
    pub fn get(&self, id: DashboardId) -> Option<Dashboard> {
        let mut entries = self.entries.lock().unwrap();
        let mut stats = self.stats.lock().unwrap();
        match entries.get(&id) {
            Some(entry) if entry.cached_at.elapsed() <= self.config.entry_ttl => {
                stats.hits += 1;
                Some(entry.dashboard.clone())
            }
            Some(_) => {
                entries.remove(&id);
                stats.expirations += 1;
                stats.misses += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    /// Store a dashboard under `id`, replacing any prior entry.
    pub fn set(&self, id: DashboardId, dashboard: Dashboard) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            id,
            CacheEntry {
                dashboard,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for `id`, if present.
    pub fn invalidate(&self, id: DashboardId) {
        self.entries.lock().unwrap().remove(&id);
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let ttl = self.config.entry_ttl;
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at.elapsed() <= ttl);
        let dropped = before - entries.len();
        self.stats.lock().unwrap().expirations += dropped as u64;
        dropped
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap().clone()
    }

    /// Resolve `id` through the cache.
    ///
    /// A fresh entry returns immediately. On a miss, a fetch already in
    /// flight for the same id is joined rather than duplicated; otherwise
    /// `fetch` starts a new one. On completion the in-flight entry is removed
    /// (success or failure) and a successful result populates the cache.
    pub async fn load<F>(&self, id: DashboardId, fetch: F) -> Result<Dashboard, GatewayError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Dashboard, GatewayError>>,
    {
        if let Some(dashboard) = self.get(id) {
            tracing::debug!(%id, "dashboard cache hit");
            return Ok(dashboard);
        }

        let shared = {
            let mut inflight = self.inflight.lock().unwrap();
            match inflight.get(&id) {
                Some(existing) => {
                    tracing::debug!(%id, "joining in-flight dashboard fetch");
                    existing.clone()
                }
                None => {
                    let shared = fetch().shared();
                    inflight.insert(id, shared.clone());
                    shared
                }
            }
        };

        let result = shared.await;
        self.inflight.lock().unwrap().remove(&id);
        if let Ok(dashboard) = &result {
            self.set(id, dashboard.clone());
        }
        result
    }
}
