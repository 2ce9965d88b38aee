//! # Quotation Commands
//!
//! The quotation screen: a form pre-filled from configuration, a live price
//! breakdown, and "save as product".
//!
//! ## Save Flow
//! ```text
//! save_quotation_as_product(form)
//!     │
//!     ├── validate (name required, no negative inputs)
//!     ├── require session
//!     ├── calculate
//!     ├── quotations.insert ────────── fails ──► error, nothing saved
//!     ├── products.insert ──────────── fails ──► error, quotation KEPT
//!     └── quotations.mark_saved_as_product
//! ```
//!
//! The steps are independent store calls. A failure after the quotation
//! is stored leaves it in place; only the failing step's error is returned.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionManager};
use filamento_core::quotation::calculate;
use filamento_core::validation::{validate_quotation_for_save, validate_quotation_input};
use filamento_core::{Machine, Product, Quotation, QuotationForm, QuotationResult};
use filamento_db::repository::generate_id;

/// Response of [`save_quotation_as_product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuotation {
    pub quotation: Quotation,
    pub product: Product,
}

/// A blank form seeded with the configured default rates.
pub fn new_quotation_form(config: &ConfigState) -> QuotationForm {
    config.new_quotation_form()
}

/// Machines offered in the form's machine picker.
pub async fn list_machines(db: &DbState) -> Result<Vec<Machine>, ApiError> {
    Ok(db.cached(&db.caches().machines, db.inner().machines()).await?)
}

/// Copies a machine's power rating into the form.
pub async fn apply_machine(
    db: &DbState,
    mut form: QuotationForm,
    machine_id: &str,
) -> Result<QuotationForm, ApiError> {
    let machine = db
        .inner()
        .machines()
        .get_by_id(machine_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Machine", machine_id))?;

    form.select_machine(&machine);
    Ok(form)
}

/// Price breakdown for the form as it stands.
///
/// Empty or unparsable fields count as 0; negative values are rejected.
pub fn calculate_quotation(form: &QuotationForm) -> Result<QuotationResult, ApiError> {
    let input = form.to_input();
    validate_quotation_input(&input)?;
    Ok(calculate(&input))
}

/// Saves the quotation and creates a zero-stock product from it.
pub async fn save_quotation_as_product(
    db: &DbState,
    sessions: &SessionManager,
    form: &QuotationForm,
) -> Result<SavedQuotation, ApiError> {
    debug!(product_name = %form.product_name, "save_quotation_as_product command");

    let input = form.to_input();
    validate_quotation_for_save(&input)?;

    let session = sessions.require_session().await?;
    let result = calculate(&input);
    let now = db.now();

    let mut quotation = Quotation::new(
        generate_id(),
        &input,
        &result,
        form.machine_id.clone(),
        Some(session.user_id.clone()),
        now,
    );
    db.inner().quotations().insert(&quotation).await?;
    db.caches().quotations.invalidate();

    let product = Product::from_quotation(generate_id(), &quotation, Some(session.user_id), now);
    if let Err(e) = db.inner().products().insert(&product).await {
        warn!(quotation_id = %quotation.id, error = %e, "Quotation saved but product was not created");
        return Err(e.into());
    }
    db.caches().products.invalidate();

    db.inner()
        .quotations()
        .mark_saved_as_product(&quotation.id, &product.id, now)
        .await?;
    quotation.saved_as_product = true;
    quotation.product_id = Some(product.id.clone());
    quotation.updated_at = now;

    info!(
        quotation_id = %quotation.id,
        product_id = %product.id,
        final_price = quotation.final_price,
        "Quotation saved as product"
    );

    Ok(SavedQuotation { quotation, product })
}

/// Saved quotations, newest first.
pub async fn list_quotations(db: &DbState) -> Result<Vec<Quotation>, ApiError> {
    Ok(db.cached(&db.caches().quotations, db.inner().quotations()).await?)
}
