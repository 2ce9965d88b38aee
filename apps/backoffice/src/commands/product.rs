//! # Product Commands
//!
//! Catalog listing, manual entries, stock increments and soft delete.
//!
//! ## Stock Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product.stock                                                          │
//! │                                                                         │
//! │  save_quotation_as_product ──► 0                                        │
//! │  add_stock(+n) ──────────────► stock + n   (movement: add)              │
//! │  register_sale(n) ───────────► stock - n   (movement: sale, n ≤ stock)  │
//! │  delete_product ─────────────► is_active = false, stock untouched       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, SessionManager};
use filamento_core::validation::{validate_name, validate_quantity};
use filamento_core::{Money, Product, StockMovement, ValidationError};
use filamento_db::repository::generate_id;

/// A product typed in by hand instead of coming from a quotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub total_cost: i64,
    pub suggested_price: i64,
    #[serde(default)]
    pub stock: i64,
}

/// Active products, newest first.
pub async fn list_products(db: &DbState) -> Result<Vec<Product>, ApiError> {
    Ok(db.cached(&db.caches().products, db.inner().products()).await?)
}

pub async fn get_product(db: &DbState, id: &str) -> Result<Product, ApiError> {
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Adds a catalog entry without a quotation behind it.
pub async fn create_product(
    db: &DbState,
    sessions: &SessionManager,
    input: NewProduct,
) -> Result<Product, ApiError> {
    validate_name("name", &input.name)?;
    for (field, value) in [
        ("total_cost", input.total_cost),
        ("suggested_price", input.suggested_price),
        ("stock", input.stock),
    ] {
        if value < 0 {
            return Err(ValidationError::Negative {
                field: field.to_string(),
            }
            .into());
        }
    }

    let session = sessions.require_session().await?;

    let product = Product::manual(
        generate_id(),
        &input.name,
        Money::from_units(input.total_cost),
        Money::from_units(input.suggested_price),
        input.stock,
        Some(session.user_id),
        db.now(),
    );
    let product = db.inner().products().insert(&product).await?;
    db.caches().products.invalidate();

    info!(product_id = %product.id, name = %product.name, "Product created");
    Ok(product)
}

/// Increments a product's stock by `quantity` (> 0).
///
/// ## Returns
/// The product with its new stock level.
pub async fn add_stock(
    db: &DbState,
    sessions: &SessionManager,
    product_id: &str,
    quantity: i64,
) -> Result<Product, ApiError> {
    debug!(product_id = %product_id, quantity, "add_stock command");

    validate_quantity(quantity)?;
    let session = sessions.require_session().await?;

    let product = db
        .inner()
        .products()
        .add_stock(product_id, quantity, Some(session.user_id), db.now())
        .await?;
    db.caches().products.invalidate();

    info!(product_id = %product.id, added = quantity, stock = product.stock, "Stock added");
    Ok(product)
}

/// Hides a product from the catalog. Its sales stay intact.
pub async fn delete_product(
    db: &DbState,
    sessions: &SessionManager,
    product_id: &str,
) -> Result<(), ApiError> {
    sessions.require_session().await?;

    db.inner().products().soft_delete(product_id, db.now()).await?;
    db.caches().products.invalidate();

    info!(product_id = %product_id, "Product deactivated");
    Ok(())
}

/// Stock history of one product, oldest first.
pub async fn product_movements(
    db: &DbState,
    product_id: &str,
) -> Result<Vec<StockMovement>, ApiError> {
    Ok(db.inner().products().movements(product_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use filamento_core::MovementType;

    #[tokio::test]
    async fn test_add_stock_logs_movement() {
        let h = testing::signed_in().await;
        let product = h.product("Llavero", 400, 1500, 0).await;

        let updated = add_stock(&h.db, &h.sessions, &product.id, 5).await.unwrap();
        assert_eq!(updated.stock, 5);

        let updated = add_stock(&h.db, &h.sessions, &product.id, 3).await.unwrap();
        assert_eq!(updated.stock, 8);

        let movements = product_movements(&h.db, &product.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.movement_type == MovementType::Add));
        assert!(movements.iter().any(|m| m.previous_stock == 5 && m.new_stock == 8));
    }

    #[tokio::test]
    async fn test_add_stock_rejects_non_positive() {
        let h = testing::signed_in().await;
        let product = h.product("Llavero", 400, 1500, 2).await;

        for quantity in [0, -4] {
            let err = add_stock(&h.db, &h.sessions, &product.id, quantity)
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }
        assert_eq!(get_product(&h.db, &product.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_add_stock_unknown_product() {
        let h = testing::signed_in().await;

        let err = add_stock(&h.db, &h.sessions, "missing", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_add_stock_overflow() {
        let h = testing::signed_in().await;
        let product = h.product("Llavero", 400, 1500, i64::MAX).await;

        let err = add_stock(&h.db, &h.sessions, &product.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(get_product(&h.db, &product.id).await.unwrap().stock, i64::MAX);
    }

    #[tokio::test]
    async fn test_add_stock_after_session_expiry() {
        let h = testing::signed_in().await;
        let product = h.product("Llavero", 400, 1500, 2).await;
        h.expire_session();

        let err = add_stock(&h.db, &h.sessions, &product.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
        assert_eq!(get_product(&h.db, &product.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_list_reflects_writes_immediately() {
        let h = testing::signed_in().await;
        assert!(list_products(&h.db).await.unwrap().is_empty());

        let created = create_product(
            &h.db,
            &h.sessions,
            NewProduct {
                name: "Soporte celular".to_string(),
                total_cost: 900,
                suggested_price: 3500,
                stock: 2,
            },
        )
        .await
        .unwrap();

        let listed = list_products(&h.db).await.unwrap();
        assert_eq!(listed.len(), 1);

        delete_product(&h.db, &h.sessions, &created.id).await.unwrap();
        assert!(list_products(&h.db).await.unwrap().is_empty());

        let hidden = get_product(&h.db, &created.id).await.unwrap();
        assert!(!hidden.is_active);
        assert_eq!(hidden.stock, 2);
    }

    #[tokio::test]
    async fn test_create_product_validation() {
        let h = testing::signed_in().await;

        let err = create_product(&h.db, &h.sessions, NewProduct::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_product(
            &h.db,
            &h.sessions,
            NewProduct {
                name: "Maceta".to_string(),
                total_cost: -1,
                ..NewProduct::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
