//! # Quotation Repository
//!
//! Saved quotations. A quotation is written first and linked to the
//! product created from it afterwards, in a separate call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::{DbError, DbResult};
use crate::live::Fetch;
use filamento_core::Quotation;

const QUOTATION_COLUMNS: &str = r#"
    id, product_name, weight_grams, print_time_hours, print_time_minutes,
    material_cost_per_gram, machine_power_watts, energy_cost_per_kwh,
    wear_cost_per_hour, labor_cost_per_hour, tax_percent, margin_percent,
    material_cost, energy_cost, wear_cost, labor_cost, subtotal,
    margin_amount, tax_amount, final_price, machine_id, created_by,
    saved_as_product, product_id, notes, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl QuotationRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        QuotationRepository { pool, feed }
    }

    /// Every quotation, newest first.
    pub async fn list(&self) -> DbResult<Vec<Quotation>> {
        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations ORDER BY created_at DESC");
        let quotations = sqlx::query_as::<_, Quotation>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = quotations.len(), "Listed quotations");
        Ok(quotations)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quotation>> {
        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?1");
        let quotation = sqlx::query_as::<_, Quotation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quotation)
    }

    pub async fn insert(&self, q: &Quotation) -> DbResult<Quotation> {
        debug!(id = %q.id, product_name = %q.product_name, "Inserting quotation");

        sqlx::query(
            r#"
            INSERT INTO quotations (
                id, product_name, weight_grams, print_time_hours, print_time_minutes,
                material_cost_per_gram, machine_power_watts, energy_cost_per_kwh,
                wear_cost_per_hour, labor_cost_per_hour, tax_percent, margin_percent,
                material_cost, energy_cost, wear_cost, labor_cost, subtotal,
                margin_amount, tax_amount, final_price, machine_id, created_by,
                saved_as_product, product_id, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27
            )
            "#,
        )
        .bind(&q.id)
        .bind(&q.product_name)
        .bind(q.weight_grams)
        .bind(q.print_time_hours)
        .bind(q.print_time_minutes)
        .bind(q.material_cost_per_gram)
        .bind(q.machine_power_watts)
        .bind(q.energy_cost_per_kwh)
        .bind(q.wear_cost_per_hour)
        .bind(q.labor_cost_per_hour)
        .bind(q.tax_percent)
        .bind(q.margin_percent)
        .bind(q.material_cost)
        .bind(q.energy_cost)
        .bind(q.wear_cost)
        .bind(q.labor_cost)
        .bind(q.subtotal)
        .bind(q.margin_amount)
        .bind(q.tax_amount)
        .bind(q.final_price)
        .bind(&q.machine_id)
        .bind(&q.created_by)
        .bind(q.saved_as_product)
        .bind(&q.product_id)
        .bind(&q.notes)
        .bind(q.created_at)
        .bind(q.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Table::Quotations, ChangeKind::Inserted, &q.id);
        Ok(q.clone())
    }

    /// Links a quotation to the product created from it.
    pub async fn mark_saved_as_product(
        &self,
        id: &str,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, product_id = %product_id, "Linking quotation to product");

        let result = sqlx::query(
            "UPDATE quotations SET saved_as_product = 1, product_id = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quotation", id));
        }

        self.feed.publish(Table::Quotations, ChangeKind::Updated, id);
        Ok(())
    }
}

#[async_trait]
impl Fetch<Quotation> for QuotationRepository {
    async fn fetch(&self) -> DbResult<Vec<Quotation>> {
        self.list().await
    }
}
