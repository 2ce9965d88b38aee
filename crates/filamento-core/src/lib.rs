//! # filamento-core: Pure Business Logic for Filamento
//!
//! This crate is the **heart** of the Filamento back office for a 3D-printing
//! shop. It contains the pricing calculator and the report aggregations as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Filamento Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend (excluded)                      │   │
//! │  │   Cotizador ──► Productos ──► Ventas ──► Finanzas ──► Reportes  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 filamento-backoffice (commands)                 │   │
//! │  │   save_quotation_as_product, register_sale, dashboard, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ filamento-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌─────────────┐ ┌────────────┐    │   │
//! │  │  │   types   │ │ quotation │ │ aggregation │ │ validation │    │   │
//! │  │  │  Product  │ │ CostModel │ │ Monthly     │ │   rules    │    │   │
//! │  │  │  Sale     │ │ ceil()    │ │ Dashboard   │ │   checks   │    │   │
//! │  │  └───────────┘ └───────────┘ └─────────────┘ └────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   filamento-db (Store Layer)                    │   │
//! │  │        SQLite, change feed, snapshot cache, auth provider       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Sale, Transaction, Material, ...)
//! - [`money`] - Money type over whole currency units
//! - [`quotation`] - The quotation cost model
//! - [`aggregation`] - Monthly series, averages and dashboard stats
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use filamento_core::quotation::{calculate, QuotationInput};
//!
//! let input = QuotationInput {
//!     product_name: "Figura decorativa".to_string(),
//!     weight_grams: 100.0,
//!     print_hours: 1.0,
//!     print_minutes: 30.0,
//!     material_cost_per_gram: 0.025,
//!     machine_power_watts: 150.0,
//!     energy_cost_per_kwh: 140.0,
//!     wear_cost_per_hour: 200.0,
//!     labor_cost_per_hour: 100.0,
//!     tax_percent: 19.0,
//!     margin_percent: 300.0,
//! };
//!
//! let result = calculate(&input);
//! assert_eq!(result.final_price.units(), 2309);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod error;
pub mod money;
pub mod quotation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quotation::{QuotationDefaults, QuotationForm, QuotationInput, QuotationResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Trailing window, in months, used by the monthly chart series.
pub const TRAILING_MONTHS: u32 = 6;

/// Rolling window, in days, used by the dashboard sales/profit cards.
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// Share of total cost shown as "suggested profit" in the sales report.
///
/// A fixed heuristic, independent of each product's stored suggested price.
pub const SUGGESTED_PROFIT_RATIO: f64 = 0.30;

/// Maximum length of free-text names (products, materials, machines).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a transaction description.
pub const MAX_DESCRIPTION_LEN: usize = 500;
