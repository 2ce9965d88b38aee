//! # Database State
//!
//! Wraps the `Database` handle together with the per-entity snapshot caches
//! and the clock every command reads "now" from.
//!
//! ## Cache Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbState                                                                │
//! │  ├── Database (pool + ChangeFeed)                                       │
//! │  ├── Arc<dyn Clock>  ◄── SystemClock in the binary, ManualClock in tests│
//! │  └── caches                                                             │
//! │        products ─┐                                                      │
//! │        materials ├── SnapshotCache<T> (TTL from config)                 │
//! │        sales     │     ▲ read by list commands and live collections    │
//! │        ...      ─┘     └ invalidated by commands after a write         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_products(db: &DbState) -> Result<Vec<Product>, ApiError> {
//!     db.cached(&db.caches().products, db.inner().products()).await
//! }
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;

use filamento_core::{Machine, Material, Product, Quotation, Sale, Transaction};
use filamento_db::{
    Clock, Database, DbResult, Fetch, LiveCollection, SnapshotCache, SystemClock, Table,
};

/// One cache per entity the screens list.
#[derive(Debug)]
pub struct Caches {
    pub products: Arc<SnapshotCache<Product>>,
    pub materials: Arc<SnapshotCache<Material>>,
    pub machines: Arc<SnapshotCache<Machine>>,
    pub quotations: Arc<SnapshotCache<Quotation>>,
    pub sales: Arc<SnapshotCache<Sale>>,
    pub transactions: Arc<SnapshotCache<Transaction>>,
}

impl Caches {
    fn new(ttl: Duration, clock: &Arc<dyn Clock>) -> Self {
        Caches {
            products: Arc::new(SnapshotCache::new("products", ttl, clock.clone())),
            materials: Arc::new(SnapshotCache::new("materials", ttl, clock.clone())),
            machines: Arc::new(SnapshotCache::new("machines", ttl, clock.clone())),
            quotations: Arc::new(SnapshotCache::new("quotations", ttl, clock.clone())),
            sales: Arc::new(SnapshotCache::new("sales", ttl, clock.clone())),
            transactions: Arc::new(SnapshotCache::new("transactions", ttl, clock.clone())),
        }
    }
}

/// Database handle, caches and clock for commands.
pub struct DbState {
    db: Database,
    clock: Arc<dyn Clock>,
    caches: Caches,
}

impl std::fmt::Debug for DbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbState")
            .field("db", &self.db)
            .field("now", &self.clock.now())
            .field("caches", &self.caches)
            .finish()
    }
}

impl DbState {
    /// Wraps a database with the system clock.
    pub fn new(db: Database, cache_ttl: Duration) -> Self {
        Self::with_clock(db, cache_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, cache_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let caches = Caches::new(cache_ttl, &clock);
        DbState { db, clock, caches }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's date by the injected clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Serves a fresh cached snapshot, or fetches and caches one.
    pub async fn cached<T, F>(&self, cache: &SnapshotCache<T>, source: F) -> DbResult<Vec<T>>
    where
        T: Clone,
        F: Fetch<T>,
    {
        if let Some(items) = cache.fresh() {
            return Ok(items);
        }

        let items = source.fetch().await?;
        cache.store(items.clone());
        Ok(items)
    }

    // =========================================================================
    // Live collections
    // =========================================================================

    pub fn live_products(&self) -> LiveCollection<Product> {
        LiveCollection::spawn(
            Table::Products,
            self.db.changes(),
            Arc::new(self.db.products()),
            Some(self.caches.products.clone()),
        )
    }

    pub fn live_materials(&self) -> LiveCollection<Material> {
        LiveCollection::spawn(
            Table::Materials,
            self.db.changes(),
            Arc::new(self.db.materials()),
            Some(self.caches.materials.clone()),
        )
    }

    pub fn live_sales(&self) -> LiveCollection<Sale> {
        LiveCollection::spawn(
            Table::Sales,
            self.db.changes(),
            Arc::new(self.db.sales()),
            Some(self.caches.sales.clone()),
        )
    }

    pub fn live_transactions(&self) -> LiveCollection<Transaction> {
        LiveCollection::spawn(
            Table::Transactions,
            self.db.changes(),
            Arc::new(self.db.transactions()),
            Some(self.caches.transactions.clone()),
        )
    }

    pub fn live_quotations(&self) -> LiveCollection<Quotation> {
        LiveCollection::spawn(
            Table::Quotations,
            self.db.changes(),
            Arc::new(self.db.quotations()),
            Some(self.caches.quotations.clone()),
        )
    }
}
