//! # Material Repository
//!
//! Raw material inventory. Deleting a material moves it to the `inactive`
//! status; it then disappears from the inventory list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::{DbError, DbResult};
use crate::live::Fetch;
use filamento_core::{Material, MaterialDraft, MaterialStatus};

const MATERIAL_COLUMNS: &str = r#"
    id, name, material_type, quantity, unit, unit_cost, status, purchase_date,
    supplier, notes, created_by, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        MaterialRepository { pool, feed }
    }

    /// Every material that is not soft-deleted, newest first.
    pub async fn list_visible(&self) -> DbResult<Vec<Material>> {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE status != ?1 ORDER BY created_at DESC"
        );
        let materials = sqlx::query_as::<_, Material>(&sql)
            .bind(MaterialStatus::Inactive)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = materials.len(), "Listed materials");
        Ok(materials)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1");
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(material)
    }

    pub async fn insert(&self, m: &Material) -> DbResult<Material> {
        debug!(id = %m.id, name = %m.name, "Inserting material");

        sqlx::query(
            r#"
            INSERT INTO materials (
                id, name, material_type, quantity, unit, unit_cost, status, purchase_date,
                supplier, notes, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&m.id)
        .bind(&m.name)
        .bind(&m.material_type)
        .bind(m.quantity)
        .bind(&m.unit)
        .bind(m.unit_cost)
        .bind(m.status)
        .bind(m.purchase_date)
        .bind(&m.supplier)
        .bind(&m.notes)
        .bind(&m.created_by)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Table::Materials, ChangeKind::Inserted, &m.id);
        Ok(m.clone())
    }

    /// Overwrites the editable fields of a visible material.
    pub async fn update(
        &self,
        id: &str,
        draft: &MaterialDraft,
        status: MaterialStatus,
        now: DateTime<Utc>,
    ) -> DbResult<Material> {
        debug!(id = %id, status = status.as_str(), "Updating material");

        let result = sqlx::query(
            r#"
            UPDATE materials SET
                name = ?2, material_type = ?3, quantity = ?4, unit = ?5, unit_cost = ?6,
                status = ?7, purchase_date = ?8, supplier = ?9, notes = ?10, updated_at = ?11
            WHERE id = ?1 AND status != ?12
            "#,
        )
        .bind(id)
        .bind(draft.name.trim())
        .bind(draft.material_type.trim())
        .bind(draft.quantity)
        .bind(&draft.unit)
        .bind(draft.unit_cost)
        .bind(status)
        .bind(draft.purchase_date)
        .bind(&draft.supplier)
        .bind(&draft.notes)
        .bind(now)
        .bind(MaterialStatus::Inactive)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        self.feed.publish(Table::Materials, ChangeKind::Updated, id);
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Material", id))
    }

    /// Moves a material to `inactive`.
    pub async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting material");

        let result = sqlx::query("UPDATE materials SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(MaterialStatus::Inactive)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        self.feed.publish(Table::Materials, ChangeKind::Deleted, id);
        Ok(())
    }

    /// Counts materials whose status is `low` or `out`.
    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM materials WHERE status IN (?1, ?2)")
                .bind(MaterialStatus::Low)
                .bind(MaterialStatus::Out)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[async_trait]
impl Fetch<Material> for MaterialRepository {
    async fn fetch(&self) -> DbResult<Vec<Material>> {
        self.list_visible().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::{NaiveDate, TimeZone};

    fn draft(name: &str, quantity: f64) -> MaterialDraft {
        MaterialDraft {
            name: name.to_string(),
            material_type: "PLA".to_string(),
            quantity,
            unit: "g".to_string(),
            unit_cost: 25.0,
            purchase_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            supplier: Some("Filamentos Chile".to_string()),
            notes: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_soft_delete_hides_material() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.materials();

        let m = Material::from_draft(generate_id(), draft("PLA negro", 1000.0), MaterialStatus::Active, None, now());
        repo.insert(&m).await.unwrap();
        assert_eq!(repo.list_visible().await.unwrap().len(), 1);

        repo.soft_delete(&m.id, now()).await.unwrap();

        assert!(repo.list_visible().await.unwrap().is_empty());
        let stored = repo.get_by_id(&m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MaterialStatus::Inactive);

        // Deleted materials cannot be edited.
        let err = repo
            .update(&m.id, &draft("PLA negro", 5.0), MaterialStatus::Low, now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_and_low_stock_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.materials();

        let a = Material::from_draft(generate_id(), draft("PLA", 1000.0), MaterialStatus::Active, None, now());
        let b = Material::from_draft(generate_id(), draft("PETG", 0.0), MaterialStatus::Out, None, now());
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        assert_eq!(repo.count_low_stock().await.unwrap(), 1);

        let updated = repo
            .update(&a.id, &draft("PLA blanco", 100.0), MaterialStatus::Low, now())
            .await
            .unwrap();
        assert_eq!(updated.name, "PLA blanco");
        assert_eq!(updated.status, MaterialStatus::Low);
        assert_eq!(repo.count_low_stock().await.unwrap(), 2);
    }
}
