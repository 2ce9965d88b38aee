//! # Live Collections
//!
//! A list that keeps itself current by refetching whenever its table
//! changes.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       LiveCollection<T>                                 │
//! │                                                                         │
//! │  spawn()                                                                │
//! │    ├── subscribe(table)           (before the first fetch, no gap)      │
//! │    ├── cache fresh? ──yes──► publish cached items                       │
//! │    │         └──no───► fetch ──► cache.store ──► publish                │
//! │    │                                                                    │
//! │    └── loop: change on table ──► fetch ──► cache.store ──► publish      │
//! │              (unconditional: a notification beats the cache TTL)       │
//! │                                                                         │
//! │  drop()                                                                 │
//! │    ├── alive = false   (an in-flight fetch discards its result)         │
//! │    └── abort listener task                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consumers read the latest [`Snapshot`] or wait for the next one through a
//! `tokio::sync::watch` receiver.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::SnapshotCache;
use crate::changes::{ChangeFeed, FeedEvent, Table, TableSubscription};
use crate::error::DbResult;

/// Something that can load the full list backing a live collection.
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self) -> DbResult<Vec<T>>;
}

/// What a live collection currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Snapshot<T> {
    fn loading() -> Self {
        Snapshot {
            items: Vec::new(),
            loading: true,
            error: None,
        }
    }

    fn ready(items: Vec<T>) -> Self {
        Snapshot {
            items,
            loading: false,
            error: None,
        }
    }
}

/// Handle to a self-refreshing list. Dropping it stops the refreshes.
pub struct LiveCollection<T> {
    table: Table,
    alive: Arc<AtomicBool>,
    receiver: watch::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveCollection<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts the collection. Must be called inside a tokio runtime.
    pub fn spawn(
        table: Table,
        feed: &ChangeFeed,
        source: Arc<dyn Fetch<T>>,
        cache: Option<Arc<SnapshotCache<T>>>,
    ) -> Self {
        let subscription = feed.subscribe(table);
        let cached = cache.as_ref().and_then(|c| c.fresh());
        let needs_fetch = cached.is_none();

        let initial = match cached {
            Some(items) => Snapshot::ready(items),
            None => Snapshot::loading(),
        };
        let (sender, receiver) = watch::channel(initial);
        let alive = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            table,
            source,
            cache,
            sender,
            alive: alive.clone(),
        };
        let task = tokio::spawn(worker.run(subscription, needs_fetch));

        debug!(table = %table, served_from_cache = !needs_fetch, "Live collection started");

        LiveCollection {
            table,
            alive,
            receiver,
            task,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// A receiver that wakes on every publish.
    pub fn watch(&self) -> watch::Receiver<Snapshot<T>> {
        self.receiver.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.task.abort();
    }
}

struct Worker<T> {
    table: Table,
    source: Arc<dyn Fetch<T>>,
    cache: Option<Arc<SnapshotCache<T>>>,
    sender: watch::Sender<Snapshot<T>>,
    alive: Arc<AtomicBool>,
}

impl<T> Worker<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(self, mut subscription: TableSubscription, needs_fetch: bool) {
        if needs_fetch {
            self.refresh().await;
        }

        while let Some(event) = subscription.next().await {
            if !self.alive.load(Ordering::Acquire) {
                break;
            }
            if let FeedEvent::Lagged(missed) = event {
                debug!(table = %self.table, missed, "Change feed lagged");
            }
            self.refresh().await;
        }
    }

    async fn refresh(&self) {
        self.sender.send_modify(|s| s.loading = true);

        let result = self.source.fetch().await;

        if !self.alive.load(Ordering::Acquire) {
            debug!(table = %self.table, "Collection dropped during fetch, discarding result");
            return;
        }

        match result {
            Ok(items) => {
                if let Some(cache) = &self.cache {
                    cache.store(items.clone());
                }
                self.sender.send_replace(Snapshot::ready(items));
            }
            Err(e) => {
                warn!(table = %self.table, error = %e, "Live collection refetch failed");
                self.sender.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeKind;
    use crate::clock::ManualClock;
    use crate::error::DbError;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Returns `[n]` where n counts calls.
    struct Counter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch<usize> for Counter {
        async fn fetch(&self) -> DbResult<Vec<usize>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![n])
        }
    }

    struct Failing;

    #[async_trait]
    impl Fetch<usize> for Failing {
        async fn fetch(&self) -> DbResult<Vec<usize>> {
            Err(DbError::QueryFailed("no such table: products".to_string()))
        }
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter {
            calls: AtomicUsize::new(0),
        })
    }

    async fn wait_for_items(rx: &mut watch::Receiver<Snapshot<usize>>, expected: Vec<usize>) {
        timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| !s.loading && s.items == expected),
        )
        .await
        .expect("timed out waiting for snapshot")
        .expect("collection closed");
    }

    #[tokio::test]
    async fn test_fetches_on_start_and_on_change() {
        let feed = ChangeFeed::new();
        let source = counter();
        let live = LiveCollection::spawn(Table::Products, &feed, source.clone(), None);
        let mut rx = live.watch();

        wait_for_items(&mut rx, vec![1]).await;

        feed.publish(Table::Sales, ChangeKind::Inserted, "s-1");
        feed.publish(Table::Products, ChangeKind::Updated, "p-1");
        wait_for_items(&mut rx, vec![2]).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_initial_fetch_but_change_refetches() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap());
        let cache = Arc::new(SnapshotCache::with_default_ttl("numbers", Arc::new(clock)));
        cache.store(vec![42]);

        let feed = ChangeFeed::new();
        let source = counter();
        let live = LiveCollection::spawn(Table::Products, &feed, source.clone(), Some(cache.clone()));

        assert_eq!(live.snapshot().items, vec![42]);
        assert!(!live.snapshot().loading);

        feed.publish(Table::Products, ChangeKind::Inserted, "p-9");
        let mut rx = live.watch();
        wait_for_items(&mut rx, vec![1]).await;

        assert_eq!(cache.fresh(), Some(vec![1]));
    }

    #[tokio::test]
    async fn test_fetch_error_is_published() {
        let feed = ChangeFeed::new();
        let live = LiveCollection::spawn(Table::Products, &feed, Arc::new(Failing), None);
        let mut rx = live.watch();

        let snapshot = timeout(Duration::from_secs(2), rx.wait_for(|s| s.error.is_some()))
            .await
            .unwrap()
            .unwrap()
            .clone();

        assert!(!snapshot.loading);
        assert!(snapshot.items.is_empty());
    }

    #[tokio::test]
    async fn test_stops_refetching_after_drop() {
        let feed = ChangeFeed::new();
        let source = counter();
        let live = LiveCollection::spawn(Table::Products, &feed, source.clone(), None);
        let mut rx = live.watch();
        wait_for_items(&mut rx, vec![1]).await;

        drop(live);

        // The sender goes away with the aborted task.
        let closed = timeout(Duration::from_secs(2), async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());

        feed.publish(Table::Products, ChangeKind::Updated, "p-1");
        tokio::task::yield_now().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
