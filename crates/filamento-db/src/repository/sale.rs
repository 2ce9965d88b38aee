//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record(sale)                                      │
//! │                                                                         │
//! │  (command already checked quantity <= stock on its copy of the product) │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE products SET stock = stock - qty                              │
//! │      WHERE id = ? AND is_active = 1 AND stock >= qty                    │
//! │      RETURNING stock                                                    │
//! │      └── no row? → ROLLBACK, DbError::StockConflict                     │
//! │    INSERT sales (...)                                                   │
//! │    INSERT stock_movements (sale, qty, previous, new)                    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  publish(Sales, Inserted) + publish(Products, Updated)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE keeps two racing sales from driving stock negative.
//! Sales are immutable: there is no update or delete.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::{DbError, DbResult};
use crate::live::Fetch;
use crate::repository::generate_id;
use crate::repository::product::insert_movement;
use filamento_core::{MovementType, Sale, StockMovement};

const SALE_COLUMNS: &str = r#"
    id, product_id, product_name, quantity, price_per_unit, total_amount,
    cost_per_unit, total_cost, profit, payment_method, client_name,
    client_email, client_phone, notes, created_by, sale_date, created_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        SaleRepository { pool, feed }
    }

    /// Lists every sale, most recent first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date DESC, created_at DESC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql).fetch_all(&self.pool).await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Lists sales on or after `since`, oldest first.
    pub async fn list_since(&self, since: NaiveDate) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE sale_date >= ?1 ORDER BY sale_date ASC, created_at ASC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        debug!(since = %since, count = sales.len(), "Listed sales since");
        Ok(sales)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Records a sale and takes its units out of stock, atomically.
    ///
    /// ## Returns
    /// * `Ok(())` - Sale stored, stock decremented, movement logged
    /// * `Err(DbError::StockConflict)` - Stock no longer covers the quantity
    pub async fn record(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, product_id = %sale.product_id, quantity = sale.quantity, "Recording sale");

        let mut tx = self.pool.begin().await?;

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND stock >= ?2
            RETURNING stock
            "#,
        )
        .bind(&sale.product_id)
        .bind(sale.quantity)
        .bind(sale.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let new_stock = new_stock.ok_or_else(|| DbError::StockConflict {
            product_id: sale.product_id.clone(),
            requested: sale.quantity,
        })?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, product_name, quantity, price_per_unit, total_amount,
                cost_per_unit, total_cost, profit, payment_method, client_name,
                client_email, client_phone, notes, created_by, sale_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(&sale.product_name)
        .bind(sale.quantity)
        .bind(sale.price_per_unit)
        .bind(sale.total_amount)
        .bind(sale.cost_per_unit)
        .bind(sale.total_cost)
        .bind(sale.profit)
        .bind(&sale.payment_method)
        .bind(&sale.client_name)
        .bind(&sale.client_email)
        .bind(&sale.client_phone)
        .bind(&sale.notes)
        .bind(&sale.created_by)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let movement = StockMovement {
            id: generate_id(),
            product_id: sale.product_id.clone(),
            quantity: sale.quantity,
            movement_type: MovementType::Sale,
            previous_stock: new_stock + sale.quantity,
            new_stock,
            notes: None,
            created_by: sale.created_by.clone(),
            created_at: sale.created_at,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        self.feed.publish(Table::Sales, ChangeKind::Inserted, &sale.id);
        self.feed
            .publish(Table::Products, ChangeKind::Updated, &sale.product_id);
        self.feed
            .publish(Table::StockMovements, ChangeKind::Inserted, &movement.id);

        Ok(())
    }
}

#[async_trait]
impl Fetch<Sale> for SaleRepository {
    async fn fetch(&self) -> DbResult<Vec<Sale>> {
        self.list().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{DateTime, TimeZone, Utc};
    use filamento_core::{Money, Product, SaleRequest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    async fn setup(stock: i64) -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = Product::manual(
            generate_id(),
            "Maceta",
            Money::from_units(485),
            Money::from_units(2309),
            stock,
            None,
            now(),
        );
        db.products().insert(&product).await.unwrap();
        (db, product)
    }

    fn sale_of(product: &Product, quantity: i64, on: NaiveDate) -> Sale {
        let request = SaleRequest {
            product_id: product.id.clone(),
            quantity,
            price_per_unit: 2000,
            ..Default::default()
        };
        Sale::record(generate_id(), product, &request, None, on, now()).unwrap()
    }

    #[tokio::test]
    async fn test_record_decrements_stock_and_logs_movement() {
        let (db, product) = setup(10).await;

        let sale = sale_of(&product, 3, now().date_naive());
        db.sales().record(&sale).await.unwrap();

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 7);

        let movements = db.products().movements(&product.id).await.unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].previous_stock, 10);
        assert_eq!(movements[0].new_stock, 7);

        let fetched = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched, sale);
    }

    #[tokio::test]
    async fn test_record_conflict_leaves_store_untouched() {
        let (db, product) = setup(2).await;

        // Priced against a stale copy that still showed 5 units.
        let mut stale = product.clone();
        stale.stock = 5;
        let sale = sale_of(&stale, 4, now().date_naive());

        let err = db.sales().record(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { requested: 4, .. }));

        assert!(db.sales().list().await.unwrap().is_empty());
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
    }

    #[tokio::test]
    async fn test_list_orders() {
        let (db, product) = setup(10).await;
        let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();

        db.sales().record(&sale_of(&product, 1, day(10))).await.unwrap();
        db.sales().record(&sale_of(&product, 1, day(2))).await.unwrap();
        db.sales().record(&sale_of(&product, 1, day(14))).await.unwrap();

        let recent: Vec<NaiveDate> = db.sales().list().await.unwrap().iter().map(|s| s.sale_date).collect();
        assert_eq!(recent, vec![day(14), day(10), day(2)]);

        let since: Vec<NaiveDate> = db
            .sales()
            .list_since(day(5))
            .await
            .unwrap()
            .iter()
            .map(|s| s.sale_date)
            .collect();
        assert_eq!(since, vec![day(10), day(14)]);
    }
}
