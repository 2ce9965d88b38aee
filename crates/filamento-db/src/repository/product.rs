//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Listing the active catalog (newest first)
//! - Manual stock increments, each logged in `stock_movements`
//! - Soft delete
//!
//! ## Stock Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_stock(id, 5)                                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT stock FROM products WHERE id = ? AND is_active → 7           │
//! │    7 + 5 checked ─── overflow ──► ROLLBACK, DbError::StockOverflow      │
//! │    UPDATE products SET stock = 12                                       │
//! │    INSERT stock_movements (add, 5, previous 7, new 12)                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  publish(Products, Updated) + publish(StockMovements, Inserted)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::{DbError, DbResult};
use crate::live::Fetch;
use crate::repository::generate_id;
use filamento_core::{MovementType, Product, StockMovement};

/// Note stored with every manual stock increment.
pub const MANUAL_INCREMENT_NOTE: &str = "Incremento manual de stock";

const PRODUCT_COLUMNS: &str = r#"
    id, name, total_cost, suggested_price, stock, quotation_id, created_by,
    created_date, is_active, created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let catalog = repo.list_active().await?;
/// let product = repo.add_stock(&catalog[0].id, 5, Some(user_id), now).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        ProductRepository { pool, feed }
    }

    /// Lists active products, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY created_at DESC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Arguments
    /// * `product` - Product to insert (id generated beforehand)
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, total_cost, suggested_price, stock, quotation_id,
                created_by, created_date, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.total_cost)
        .bind(product.suggested_price)
        .bind(product.stock)
        .bind(&product.quotation_id)
        .bind(&product.created_by)
        .bind(product.created_date)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Table::Products, ChangeKind::Inserted, &product.id);
        Ok(product.clone())
    }

    /// Adds units to an active product's stock and logs the movement.
    ///
    /// ## Returns
    /// The product with its new stock level.
    pub async fn add_stock(
        &self,
        id: &str,
        quantity: i64,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> DbResult<Product> {
        debug!(id = %id, quantity, "Adding stock");

        let mut tx = self.pool.begin().await?;

        let previous_stock: i64 =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1 AND is_active = 1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", id))?;

        let new_stock = previous_stock
            .checked_add(quantity)
            .ok_or_else(|| DbError::StockOverflow {
                product_id: id.to_string(),
                added: quantity,
            })?;

        sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_stock)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let movement = StockMovement {
            id: generate_id(),
            product_id: id.to_string(),
            quantity,
            movement_type: MovementType::Add,
            previous_stock,
            new_stock,
            notes: Some(MANUAL_INCREMENT_NOTE.to_string()),
            created_by,
            created_at: now,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        self.feed.publish(Table::Products, ChangeKind::Updated, id);
        self.feed
            .publish(Table::StockMovements, ChangeKind::Inserted, &movement.id);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Sales keep pointing at the row, so it is never removed.
    pub async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.feed.publish(Table::Products, ChangeKind::Deleted, id);
        Ok(())
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sums stock over active products.
    pub async fn total_stock(&self) -> DbResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(stock), 0) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    /// Stock history of one product, oldest first.
    pub async fn movements(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, quantity, movement_type, previous_stock, new_stock,
                   notes, created_by, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

#[async_trait]
impl Fetch<Product> for ProductRepository {
    async fn fetch(&self) -> DbResult<Vec<Product>> {
        self.list_active().await
    }
}

/// Writes a stock movement inside an open transaction.
pub(crate) async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, quantity, movement_type, previous_stock, new_stock,
            notes, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.quantity)
    .bind(movement.movement_type)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(&movement.notes)
    .bind(&movement.created_by)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use filamento_core::Money;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn product(name: &str, stock: i64, at: DateTime<Utc>) -> Product {
        Product::manual(
            generate_id(),
            name,
            Money::from_units(485),
            Money::from_units(2309),
            stock,
            None,
            at,
        )
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_active_newest_first_and_skips_deleted() {
        let db = db().await;
        let repo = db.products();

        let older = repo.insert(&product("Maceta", 1, now())).await.unwrap();
        let newer = repo
            .insert(&product("Llavero", 2, now() + Duration::minutes(5)))
            .await
            .unwrap();
        let gone = repo
            .insert(&product("Descontinuado", 9, now() + Duration::minutes(9)))
            .await
            .unwrap();
        repo.soft_delete(&gone.id, now()).await.unwrap();

        let listed: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(listed, vec![newer.id, older.id]);
        assert_eq!(repo.count_active().await.unwrap(), 2);
        assert_eq!(repo.total_stock().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_add_stock_logs_movement() {
        let db = db().await;
        let repo = db.products();
        let p = repo.insert(&product("Maceta", 7, now())).await.unwrap();

        let updated = repo.add_stock(&p.id, 5, None, now()).await.unwrap();
        assert_eq!(updated.stock, 12);

        let movements = repo.movements(&p.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Add);
        assert_eq!(movements[0].previous_stock, 7);
        assert_eq!(movements[0].new_stock, 12);
        assert_eq!(movements[0].notes.as_deref(), Some(MANUAL_INCREMENT_NOTE));
    }

    #[tokio::test]
    async fn test_add_stock_unknown_product_is_not_found() {
        let db = db().await;
        let err = db
            .products()
            .add_stock("missing", 1, None, now())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_stock_overflow_leaves_stock_untouched() {
        let db = db().await;
        let repo = db.products();
        let p = repo.insert(&product("Maceta", i64::MAX - 1, now())).await.unwrap();

        let err = repo.add_stock(&p.id, 2, None, now()).await.unwrap_err();
        assert!(matches!(err, DbError::StockOverflow { added: 2, .. }));

        let unchanged = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock, i64::MAX - 1);
        assert!(repo.movements(&p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let db = db().await;
        let mut sub = db.changes().subscribe(Table::Products);

        let p = db.products().insert(&product("Maceta", 0, now())).await.unwrap();

        match sub.next().await {
            Some(crate::changes::FeedEvent::Changed(change)) => {
                assert_eq!(change.kind, ChangeKind::Inserted);
                assert_eq!(change.id, p.id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
