//! # Machine Repository
//!
//! Printers available for quoting.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::DbResult;
use crate::live::Fetch;
use filamento_core::Machine;

const MACHINE_COLUMNS: &str =
    "id, name, model, power_consumption_watts, is_active, purchase_date, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct MachineRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl MachineRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        MachineRepository { pool, feed }
    }

    /// Active machines, alphabetically.
    pub async fn list_active(&self) -> DbResult<Vec<Machine>> {
        let sql = format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE is_active = 1 ORDER BY name");
        let machines = sqlx::query_as::<_, Machine>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = machines.len(), "Listed machines");
        Ok(machines)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Machine>> {
        let sql = format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE id = ?1");
        let machine = sqlx::query_as::<_, Machine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(machine)
    }

    pub async fn insert(&self, m: &Machine) -> DbResult<Machine> {
        debug!(id = %m.id, name = %m.name, "Inserting machine");

        sqlx::query(
            r#"
            INSERT INTO machines (
                id, name, model, power_consumption_watts, is_active, purchase_date,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&m.id)
        .bind(&m.name)
        .bind(&m.model)
        .bind(m.power_consumption_watts)
        .bind(m.is_active)
        .bind(m.purchase_date)
        .bind(&m.notes)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Table::Machines, ChangeKind::Inserted, &m.id);
        Ok(m.clone())
    }
}

#[async_trait]
impl Fetch<Machine> for MachineRepository {
    async fn fetch(&self) -> DbResult<Vec<Machine>> {
        self.list_active().await
    }
}
