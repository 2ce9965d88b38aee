//! # Snapshot Cache
//!
//! Holds the last fetched list of one entity type together with the time it
//! was fetched.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store(items) at t0                                                     │
//! │                                                                         │
//! │  fresh() at t0 + 10s  ──► Some(items)     (age < ttl)                   │
//! │  fresh() at t0 + 30s  ──► None            (age >= ttl)                  │
//! │  invalidate(); fresh() ──► None                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache has no authority: the store is the source of truth and every
//! entry is a best-effort copy. Each instance is owned by whoever needs it
//! (the backoffice keeps one per entity in its database state).

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};
use tracing::trace;

use crate::clock::Clock;

/// Default time-to-live of a snapshot.
pub const DEFAULT_TTL_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct Entry<T> {
    items: Vec<T>,
    fetched_at: DateTime<Utc>,
}

/// TTL cache for one entity list.
pub struct SnapshotCache<T> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> SnapshotCache<T> {
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        SnapshotCache {
            name,
            ttl,
            clock,
            entry: RwLock::new(None),
        }
    }

    pub fn with_default_ttl(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self::new(name, Duration::seconds(DEFAULT_TTL_SECS), clock)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the snapshot if it is younger than the TTL.
    pub fn fresh(&self) -> Option<Vec<T>> {
        let now = self.clock.now();
        let guard = self.entry.read().ok()?;
        let entry = guard.as_ref()?;

        if now - entry.fetched_at < self.ttl {
            trace!(cache = self.name, "Snapshot hit");
            Some(entry.items.clone())
        } else {
            trace!(cache = self.name, "Snapshot expired");
            None
        }
    }

    /// Replaces the snapshot, stamped with the current time.
    pub fn store(&self, items: Vec<T>) {
        let fetched_at = self.clock.now();
        if let Ok(mut guard) = self.entry.write() {
            *guard = Some(Entry { items, fetched_at });
        }
    }

    /// Drops the snapshot so the next read goes to the store.
    pub fn invalidate(&self) {
        trace!(cache = self.name, "Snapshot invalidated");
        if let Ok(mut guard) = self.entry.write() {
            *guard = None;
        }
    }
}

impl<T> std::fmt::Debug for SnapshotCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish()
    }
}
