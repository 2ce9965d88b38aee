//! # Repository Module
//!
//! Database repository implementations for Filamento.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Backoffice command                                                    │
//! │       │                                                                 │
//! │       │  db.products().add_stock(id, 5, user, now)                     │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── SQL against the pool                                              │
//! │  └── ChangeFeed::publish(Products, Updated, id)  (after commit)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database              LiveCollection<Product> refetches        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository holds a pool handle and the shared change feed. Writes
//! publish only after they are durable, so a subscriber that refetches sees
//! the new row.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog, stock increments, soft delete
//! - [`SaleRepository`] - Sales with atomic stock decrement
//! - [`QuotationRepository`] - Saved quotations
//! - [`TransactionRepository`] - Manual income/expense ledger
//! - [`MaterialRepository`] - Raw material inventory
//! - [`MachineRepository`] - Printers and their power rating
//! - [`UserRepository`] - Accounts and profiles

pub mod machine;
pub mod material;
pub mod product;
pub mod quotation;
pub mod sale;
pub mod transaction;
pub mod user;

pub use machine::MachineRepository;
pub use material::MaterialRepository;
pub use product::ProductRepository;
pub use quotation::QuotationRepository;
pub use sale::SaleRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;

use uuid::Uuid;

/// Generates a new primary key.
///
/// ## Usage
/// ```rust
/// let id = filamento_db::repository::generate_id();
/// assert_eq!(id.len(), 36);
/// ```
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
