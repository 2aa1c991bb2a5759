// src/cache/mod.rs

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::fetch::TableSource;
use crate::table::Table;

/// A table as it was fetched, with the time it arrived.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub url: String,
    pub table: Arc<Table>,
    /// Wall-clock time of the fetch, for display.
    pub fetched_at: DateTime<Utc>,
    /// Monotonic time of the fetch, for expiry.
    loaded: Instant,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        self.loaded.elapsed()
    }
}

/// One slot per URL. The async lock is held across the fetch, so callers
/// racing on the same key queue up behind a single in-flight request.
type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

/// Memoizes [`TableSource::fetch_table`] per URL for a bounded time-to-live.
///
/// Failed fetches are not stored; the next caller tries again.
pub struct RefreshCache<S> {
    source: S,
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<S: TableSource> RefreshCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, url: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.entry(url.to_string()).or_default().clone()
    }

    /// Return the cached table for `url`, fetching it if absent or older than the TTL.
    pub async fn get(&self, url: &str) -> Result<CacheEntry> {
        let slot = self.slot(url);
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            let age = entry.age();
            if age <= self.ttl {
                debug!(url, age_ms = age.as_millis() as u64, "cache hit");
                return Ok(entry.clone());
            }
            debug!(url, age_ms = age.as_millis() as u64, "cache entry expired");
            *guard = None;
        } else {
            debug!(url, "cache miss");
        }

        match self.source.fetch_table(url).await {
            Ok(table) => {
                let entry = CacheEntry {
                    url: url.to_string(),
                    table: Arc::new(table),
                    fetched_at: Utc::now(),
                    loaded: Instant::now(),
                };
                *guard = Some(entry.clone());
                Ok(entry)
            }
            Err(e) => {
                warn!(url, error = %e, "fetch failed; not cached");
                Err(e)
            }
        }
    }

    /// Drop the entry for `url` so the next `get` refetches.
    pub async fn invalidate(&self, url: &str) {
        let slot = self.slot(url);
        let mut guard = slot.lock().await;
        if guard.take().is_some() {
            debug!(url, "cache entry invalidated");
        }
    }
}
