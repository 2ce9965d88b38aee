//! # Validation Module
//!
//! Business rule checks run by the command layer before any store call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form                                                     │
//! │  └── Empty fields, immediate feedback                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Backoffice command (Rust)                                    │
//! │  └── THIS MODULE: required fields, non-negative rates, positive qty    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use filamento_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Maceta geométrica").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::quotation::QuotationInput;
use crate::types::{MaterialDraft, TransactionDraft};
use crate::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text name (product, material, machine).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use filamento_core::validation::validate_name;
///
/// assert!(validate_name("name", "Llavero").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_text(field, value, MAX_NAME_LEN)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit count (stock increment, sale quantity).
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Productos: Agregar stock                                               │
/// │                                                                         │
/// │  User enters quantity: 0                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       └── qty <= 0? → "quantity must be positive" (no store call)      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a money amount that must be strictly positive.
pub fn validate_positive_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a rate or measurement that may be zero but not negative.
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Rejects quotation inputs that must not reach the calculator.
///
/// The product name is required only when saving, so it is not checked here.
pub fn validate_quotation_input(input: &QuotationInput) -> ValidationResult<()> {
    let fields = [
        ("weight_grams", input.weight_grams),
        ("print_hours", input.print_hours),
        ("print_minutes", input.print_minutes),
        ("material_cost_per_gram", input.material_cost_per_gram),
        ("machine_power_watts", input.machine_power_watts),
        ("energy_cost_per_kwh", input.energy_cost_per_kwh),
        ("wear_cost_per_hour", input.wear_cost_per_hour),
        ("labor_cost_per_hour", input.labor_cost_per_hour),
        ("tax_percent", input.tax_percent),
        ("margin_percent", input.margin_percent),
    ];

    for (field, value) in fields {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

/// Checks a quotation before it is saved as a product.
pub fn validate_quotation_for_save(input: &QuotationInput) -> ValidationResult<()> {
    validate_name("product_name", &input.product_name)?;
    validate_quotation_input(input)
}

/// Checks the material dialog.
pub fn validate_material_draft(draft: &MaterialDraft) -> ValidationResult<()> {
    validate_name("name", &draft.name)?;
    validate_name("type", &draft.material_type)?;
    validate_name("unit", &draft.unit)?;
    validate_non_negative("quantity", draft.quantity)?;
    validate_non_negative("unit_cost", draft.unit_cost)?;
    Ok(())
}

/// Checks the "Nueva transacción" dialog.
pub fn validate_transaction_draft(draft: &TransactionDraft) -> ValidationResult<()> {
    validate_text("description", &draft.description, MAX_DESCRIPTION_LEN)?;
    validate_positive_amount("amount", draft.amount)
}

/// Checks an email address shape. Deliverability is not checked.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like user@domain".to_string(),
        }),
    }
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use filamento_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Maceta").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("name", &"ñ".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_quotation_input_rejects_negatives() {
        let mut input = QuotationInput {
            weight_grams: 10.0,
            ..Default::default()
        };
        assert!(validate_quotation_input(&input).is_ok());

        input.labor_cost_per_hour = -1.0;
        let err = validate_quotation_input(&input).unwrap_err();
        assert_eq!(err.to_string(), "labor_cost_per_hour must not be negative");

        input.labor_cost_per_hour = f64::NAN;
        assert!(matches!(
            validate_quotation_input(&input),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quotation_for_save_requires_name() {
        let input = QuotationInput::default();
        assert!(matches!(
            validate_quotation_for_save(&input),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_transaction_draft() {
        let mut draft = TransactionDraft {
            transaction_type: TransactionType::Expense,
            description: "Filamento PLA".to_string(),
            amount: 15_000,
            transaction_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(validate_transaction_draft(&draft).is_ok());

        draft.amount = 0;
        assert!(validate_transaction_draft(&draft).is_err());

        draft.amount = 10;
        draft.description = " ".to_string();
        assert!(validate_transaction_draft(&draft).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@taller3d.cl").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@taller3d.cl").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
