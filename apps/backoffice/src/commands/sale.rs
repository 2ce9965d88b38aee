//! # Sale Commands
//!
//! Registering a sale from the "Vender" dialog, and the sales list.
//!
//! ## Register Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_sale(request)                                                 │
//! │       │                                                                 │
//! │       ├── quantity > 0, price ≥ 0 ───────────────► VALIDATION_ERROR     │
//! │       ├── require session ───────────────────────► SESSION_EXPIRED      │
//! │       ├── load product ──────────────────────────► NOT_FOUND            │
//! │       ├── Sale::record (quantity ≤ stock) ───────► INSUFFICIENT_STOCK   │
//! │       │        (totals fit in i64) ──────────────► VALIDATION_ERROR     │
//! │       │        (nothing written yet)                                    │
//! │       └── sales.record: insert sale + decrement stock in one tx         │
//! │                └── stock moved underneath us ────► INSUFFICIENT_STOCK   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ErrorCode};
use crate::state::{DbState, SessionManager};
use filamento_core::validation::validate_quantity;
use filamento_core::{CoreError, Sale, SaleRequest, ValidationError};
use filamento_db::repository::generate_id;

/// Records a sale and takes its units out of stock.
///
/// `sale_date` defaults to today.
pub async fn register_sale(
    db: &DbState,
    sessions: &SessionManager,
    request: SaleRequest,
    sale_date: Option<NaiveDate>,
) -> Result<Sale, ApiError> {
    debug!(product_id = %request.product_id, quantity = request.quantity, "register_sale command");

    validate_quantity(request.quantity)?;
    if request.price_per_unit < 0 {
        return Err(ValidationError::Negative {
            field: "price_per_unit".to_string(),
        }
        .into());
    }

    let session = sessions.require_session().await?;

    let product = db
        .inner()
        .products()
        .get_by_id(&request.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &request.product_id))?;

    let sale = Sale::record(
        generate_id(),
        &product,
        &request,
        Some(session.user_id),
        sale_date.unwrap_or_else(|| db.today()),
        db.now(),
    )
    .map_err(|e| {
        if let CoreError::InsufficientStock { available, requested, .. } = &e {
            warn!(product_id = %product.id, available, requested, "Sale rejected: insufficient stock");
        }
        ApiError::from(e)
    })?;

    if let Err(e) = db.inner().sales().record(&sale).await {
        let err = ApiError::from(e);
        if err.code == ErrorCode::InsufficientStock {
            warn!(product_id = %product.id, "Stock changed before the sale was stored");
        }
        return Err(err);
    }

    db.caches().sales.invalidate();
    db.caches().products.invalidate();

    info!(
        sale_id = %sale.id,
        product_id = %sale.product_id,
        quantity = sale.quantity,
        total = sale.total_amount,
        profit = sale.profit,
        "Sale registered"
    );

    Ok(sale)
}

/// Every sale, most recent first.
pub async fn list_sales(db: &DbState) -> Result<Vec<Sale>, ApiError> {
    Ok(db.cached(&db.caches().sales, db.inner().sales()).await?)
}
