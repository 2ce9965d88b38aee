//! # Commands Module
//!
//! The operations the back office screens invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── auth.rs       ◄─── Sign in/up/out, current user
//! ├── quotation.rs  ◄─── Form, calculate, save as product
//! ├── product.rs    ◄─── Catalog, add stock, soft delete
//! ├── sale.rs       ◄─── Register sale
//! ├── material.rs   ◄─── Material inventory
//! ├── finance.rs    ◄─── Income/expense ledger
//! ├── dashboard.rs  ◄─── Dashboard cards and chart
//! └── report.rs     ◄─── Report charts
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Write Command Flow                                   │
//! │                                                                         │
//! │  register_sale(db, sessions, request)                                   │
//! │         │                                                               │
//! │         ├── 1. validate input ───────────────► VALIDATION_ERROR         │
//! │         ├── 2. sessions.require_session() ───► SESSION_EXPIRED          │
//! │         ├── 3. business rule checks ─────────► INSUFFICIENT_STOCK       │
//! │         ├── 4. store calls ──────────────────► DATABASE_ERROR           │
//! │         ├── 5. invalidate affected caches                               │
//! │         └── 6. info!(...) and return the stored record                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_products(db: &DbState)
//!
//! // Needs database and session
//! async fn add_stock(db: &DbState, sessions: &SessionManager, ...)
//!
//! // Needs configuration too
//! async fn add_material(db: &DbState, sessions: &SessionManager, config: &ConfigState, ...)
//! ```

pub mod auth;
pub mod dashboard;
pub mod finance;
pub mod material;
pub mod product;
pub mod quotation;
pub mod report;
pub mod sale;

#[cfg(test)]
pub(crate) mod testing;
