//! # filamento-db: Data Access for Filamento
//!
//! SQLite persistence for the back office, the change feed that keeps open
//! views current, and the local session provider.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Filamento Data Flow                                │
//! │                                                                         │
//! │  Backoffice command (register_sale)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   filamento-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │   Database   │   │ Repositories  │   │   ChangeFeed     │  │   │
//! │  │   │  (pool.rs)   │◄──│ products      │──►│  (changes.rs)    │  │   │
//! │  │   │              │   │ sales         │   │        │         │  │   │
//! │  │   │ SqlitePool   │   │ quotations    │   │        ▼         │  │   │
//! │  │   │ migrations   │   │ transactions  │   │ LiveCollection   │  │   │
//! │  │   └──────────────┘   │ materials ... │   │ SnapshotCache    │  │   │
//! │  │                      └───────────────┘   └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   LocalAuthProvider (auth.rs) ── users table, argon2, HS256    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (filamento.db)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//! - [`changes`] - Row-change broadcast
//! - [`live`] - Collections that refetch on change
//! - [`cache`] - Time-boxed snapshots
//! - [`clock`] - Injectable time source
//! - [`auth`] - Session provider
//!
//! ## Usage
//!
//! ```rust,ignore
//! use filamento_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("filamento.db")).await?;
//! let products = db.products().list_active().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cache;
pub mod changes;
pub mod clock;
pub mod error;
pub mod live;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthError, AuthProvider, AuthResult, LocalAuthProvider, Session};
pub use cache::SnapshotCache;
pub use changes::{ChangeFeed, ChangeKind, FeedEvent, Table, TableChange, TableSubscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DbError, DbResult};
pub use live::{Fetch, LiveCollection, Snapshot};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    MachineRepository, MaterialRepository, ProductRepository, QuotationRepository,
    SaleRepository, TransactionRepository, UserRepository,
};
