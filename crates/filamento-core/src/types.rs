//! # Domain Types
//!
//! Core domain records used throughout Filamento.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Quotation     │──►│    Product      │◄──│      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  inputs         │   │  total_cost     │   │  quantity       │       │
//! │  │  cost breakdown │   │  suggested_price│   │  price_per_unit │       │
//! │  │  final_price    │   │  stock          │   │  profit         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │                        ┌────────▼────────┐                              │
//! │                        │  StockMovement  │                              │
//! │                        │  add / sale     │                              │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Transaction   │   │    Material     │   │    Machine      │       │
//! │  │  income/expense │   │  status: active │   │  power (W)      │       │
//! │  │  (manual entry) │   │  low/out/inact. │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutability
//! Sales and transactions are never edited after creation. Products and
//! materials are never physically removed: products flip `is_active`,
//! materials move to [`MaterialStatus::Inactive`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quotation::{QuotationInput, QuotationResult};

// =============================================================================
// Machine
// =============================================================================

/// A printer in the shop. Its power rating feeds the energy cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub model: Option<String>,
    pub power_consumption_watts: f64,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Material
// =============================================================================

/// Stock status of a raw material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    Active,
    /// Running low, shown in the dashboard "Bajo stock" card.
    Low,
    /// Depleted, also counted as low stock.
    Out,
    /// Soft-deleted.
    Inactive,
}

impl MaterialStatus {
    /// Derives the status of a live material from its remaining quantity.
    ///
    /// Never returns `Inactive`; that state is only reached by deletion.
    pub fn for_quantity(quantity: f64, low_threshold: f64) -> Self {
        if quantity <= 0.0 {
            MaterialStatus::Out
        } else if quantity <= low_threshold {
            MaterialStatus::Low
        } else {
            MaterialStatus::Active
        }
    }

    /// Whether the dashboard counts this material as low stock.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        matches!(self, MaterialStatus::Low | MaterialStatus::Out)
    }

    /// Lowercase name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Active => "active",
            MaterialStatus::Low => "low",
            MaterialStatus::Out => "out",
            MaterialStatus::Inactive => "inactive",
        }
    }
}

impl Default for MaterialStatus {
    fn default() -> Self {
        MaterialStatus::Active
    }
}

/// A raw consumable (filament roll, resin bottle, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Material {
    pub id: String,
    pub name: String,
    /// Free-form kind: "PLA", "PETG", "Resina", ...
    #[serde(rename = "type")]
    pub material_type: String,
    pub quantity: f64,
    /// Unit of `quantity`: "g", "kg", "ml", ...
    pub unit: String,
    /// Cost per `unit`.
    pub unit_cost: f64,
    pub status: MaterialStatus,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields entered in the material dialog (create and edit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: f64,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

impl Material {
    /// Builds a new material record from a validated draft.
    pub fn from_draft(
        id: String,
        draft: MaterialDraft,
        status: MaterialStatus,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Material {
            id,
            name: draft.name.trim().to_string(),
            material_type: draft.material_type.trim().to_string(),
            quantity: draft.quantity,
            unit: draft.unit,
            unit_cost: draft.unit_cost,
            status,
            purchase_date: draft.purchase_date,
            supplier: draft.supplier,
            notes: draft.notes,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Quotation (saved)
// =============================================================================

/// A saved quotation: the inputs and the computed breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Quotation {
    pub id: String,
    pub product_name: String,
    pub weight_grams: f64,
    pub print_time_hours: f64,
    pub print_time_minutes: f64,
    pub material_cost_per_gram: f64,
    pub machine_power_watts: f64,
    pub energy_cost_per_kwh: f64,
    pub wear_cost_per_hour: f64,
    pub labor_cost_per_hour: f64,
    pub tax_percent: f64,
    pub margin_percent: f64,
    pub material_cost: i64,
    pub energy_cost: i64,
    pub wear_cost: i64,
    pub labor_cost: i64,
    pub subtotal: i64,
    pub margin_amount: i64,
    pub tax_amount: i64,
    pub final_price: i64,
    pub machine_id: Option<String>,
    pub created_by: Option<String>,
    pub saved_as_product: bool,
    pub product_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    /// Freezes an input and its result into a record.
    pub fn new(
        id: String,
        input: &QuotationInput,
        result: &QuotationResult,
        machine_id: Option<String>,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Quotation {
            id,
            product_name: input.product_name.trim().to_string(),
            weight_grams: input.weight_grams,
            print_time_hours: input.print_hours,
            print_time_minutes: input.print_minutes,
            material_cost_per_gram: input.material_cost_per_gram,
            machine_power_watts: input.machine_power_watts,
            energy_cost_per_kwh: input.energy_cost_per_kwh,
            wear_cost_per_hour: input.wear_cost_per_hour,
            labor_cost_per_hour: input.labor_cost_per_hour,
            tax_percent: input.tax_percent,
            margin_percent: input.margin_percent,
            material_cost: result.material_cost.units(),
            energy_cost: result.energy_cost.units(),
            wear_cost: result.wear_cost.units(),
            labor_cost: result.labor_cost.units(),
            subtotal: result.subtotal.units(),
            margin_amount: result.margin_amount.units(),
            tax_amount: result.tax_amount.units(),
            final_price: result.final_price.units(),
            machine_id,
            created_by,
            saved_as_product: false,
            product_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_units(self.subtotal)
    }

    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_units(self.final_price)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,

    /// Manufacturing cost per unit (the quotation subtotal).
    pub total_cost: i64,

    /// Suggested selling price per unit (the quotation final price).
    pub suggested_price: i64,

    /// Units on hand.
    pub stock: i64,

    /// Quotation that produced this product, if any.
    pub quotation_id: Option<String>,

    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_date: NaiveDate,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a catalog entry from a saved quotation, with zero stock.
    pub fn from_quotation(
        id: String,
        quotation: &Quotation,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Product {
            id,
            name: quotation.product_name.clone(),
            total_cost: quotation.subtotal,
            suggested_price: quotation.final_price,
            stock: 0,
            quotation_id: Some(quotation.id.clone()),
            created_by,
            created_date: now.date_naive(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a catalog entry typed in by hand.
    pub fn manual(
        id: String,
        name: &str,
        total_cost: Money,
        suggested_price: Money,
        stock: i64,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Product {
            id,
            name: name.trim().to_string(),
            total_cost: total_cost.units(),
            suggested_price: suggested_price.units(),
            stock,
            quotation_id: None,
            created_by,
            created_date: now.date_naive(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_units(self.total_cost)
    }

    #[inline]
    pub fn suggested_price(&self) -> Money {
        Money::from_units(self.suggested_price)
    }

    /// Checks that `quantity` units can be sold right now.
    pub fn ensure_can_sell(&self, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if !self.is_active {
            return Err(CoreError::ProductInactive(self.id.clone()));
        }

        if quantity > self.stock {
            return Err(CoreError::InsufficientStock {
                product: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Why a product's stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Manual stock increment.
    Add,
    /// Stock leaving with a sale.
    Sale,
}

/// One change to a product's stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Always positive; direction follows `movement_type`.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// What the seller enters in the "Vender" dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
    pub price_per_unit: i64,
    pub payment_method: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

/// A recorded sale. Immutable once created.
///
/// Product name and unit cost are snapshots taken at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price_per_unit: i64,
    /// quantity × price_per_unit
    pub total_amount: i64,
    pub cost_per_unit: i64,
    /// quantity × cost_per_unit
    pub total_cost: i64,
    /// total_amount − total_cost
    pub profit: i64,
    pub payment_method: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Prices a sale request against the product it sells.
    ///
    /// Rejects non-positive quantities, negative prices, inactive products
    /// and quantities above the current stock. No store call happens before
    /// this check passes.
    pub fn record(
        id: String,
        product: &Product,
        request: &SaleRequest,
        created_by: Option<String>,
        sale_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if request.price_per_unit < 0 {
            return Err(ValidationError::Negative {
                field: "price_per_unit".to_string(),
            }
            .into());
        }

        product.ensure_can_sell(request.quantity)?;

        let overflow = |field: &str| ValidationError::Overflow {
            field: field.to_string(),
        };
        let price = Money::from_units(request.price_per_unit);
        let total_amount = price
            .checked_multiply_quantity(request.quantity)
            .ok_or_else(|| overflow("total_amount"))?;
        let total_cost = product
            .total_cost()
            .checked_multiply_quantity(request.quantity)
            .ok_or_else(|| overflow("total_cost"))?;
        let profit = total_amount - total_cost;

        Ok(Sale {
            id,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: request.quantity,
            price_per_unit: price.units(),
            total_amount: total_amount.units(),
            cost_per_unit: product.total_cost,
            total_cost: total_cost.units(),
            profit: profit.units(),
            payment_method: request.payment_method.clone(),
            client_name: request.client_name.clone(),
            client_email: request.client_email.clone(),
            client_phone: request.client_phone.clone(),
            notes: request.notes.clone(),
            created_by,
            sale_date,
            created_at: now,
        })
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_units(self.total_amount)
    }

    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_units(self.total_cost)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_units(self.profit)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Direction of a manual ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::str::FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "ingreso" => Ok(TransactionType::Income),
            "expense" | "egreso" => Ok(TransactionType::Expense),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["income".to_string(), "expense".to_string()],
            }),
        }
    }
}

/// A manually entered income or expense. Independent of sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: i64,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// What the user enters in the "Nueva transacción" dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: i64,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
}

impl Transaction {
    pub fn from_draft(
        id: String,
        draft: TransactionDraft,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id,
            transaction_type: draft.transaction_type,
            description: draft.description.trim().to_string(),
            amount: draft.amount,
            transaction_date: draft.transaction_date,
            created_by,
            created_at: now,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_units(self.amount)
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// Public profile of a signed-up user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn product(stock: i64) -> Product {
        Product::manual(
            "p-1".to_string(),
            "Maceta geométrica",
            Money::from_units(485),
            Money::from_units(2309),
            stock,
            None,
            now(),
        )
    }

    #[test]
    fn test_sale_record_computes_totals() {
        let request = SaleRequest {
            product_id: "p-1".to_string(),
            quantity: 3,
            price_per_unit: 2000,
            ..Default::default()
        };

        let sale = Sale::record(
            "s-1".to_string(),
            &product(10),
            &request,
            Some("u-1".to_string()),
            now().date_naive(),
            now(),
        )
        .unwrap();

        assert_eq!(sale.total_amount, 6000);
        assert_eq!(sale.cost_per_unit, 485);
        assert_eq!(sale.total_cost, 1455);
        assert_eq!(sale.profit, 4545);
        assert_eq!(sale.product_name, "Maceta geométrica");
    }

    #[test]
    fn test_sale_rejects_quantity_above_stock() {
        let request = SaleRequest {
            product_id: "p-1".to_string(),
            quantity: 4,
            price_per_unit: 2000,
            ..Default::default()
        };

        let err = Sale::record(
            "s-1".to_string(),
            &product(3),
            &request,
            None,
            now().date_naive(),
            now(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_sale_rejects_total_that_overflows() {
        let request = SaleRequest {
            product_id: "p-1".to_string(),
            quantity: 3,
            price_per_unit: i64::MAX / 2,
            ..Default::default()
        };

        let err = Sale::record(
            "s-1".to_string(),
            &product(3),
            &request,
            None,
            now().date_naive(),
            now(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Overflow { ref field }) if field == "total_amount"
        ));
    }

    #[test]
    fn test_sale_rejects_zero_quantity_and_inactive_product() {
        assert!(product(5).ensure_can_sell(0).is_err());

        let mut inactive = product(5);
        inactive.is_active = false;
        assert!(matches!(
            inactive.ensure_can_sell(1),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_material_status_for_quantity() {
        assert_eq!(MaterialStatus::for_quantity(0.0, 200.0), MaterialStatus::Out);
        assert_eq!(MaterialStatus::for_quantity(150.0, 200.0), MaterialStatus::Low);
        assert_eq!(MaterialStatus::for_quantity(800.0, 200.0), MaterialStatus::Active);
        assert!(MaterialStatus::Low.is_low_stock());
        assert!(MaterialStatus::Out.is_low_stock());
        assert!(!MaterialStatus::Inactive.is_low_stock());
    }

    #[test]
    fn test_transaction_type_parse_and_serde() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("Egreso".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("refund".parse::<TransactionType>().is_err());

        let json = serde_json::to_string(&TransactionType::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
    }
}
