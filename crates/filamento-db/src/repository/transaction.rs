//! # Transaction Repository
//!
//! The manual income/expense ledger. Entries are append-only.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, ChangeKind, Table};
use crate::error::DbResult;
use crate::live::Fetch;
use filamento_core::Transaction;

/// How many entries the finance screen shows.
pub const RECENT_LIMIT: i64 = 100;

const TRANSACTION_COLUMNS: &str =
    "id, transaction_type, description, amount, transaction_date, created_by, created_at";

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        TransactionRepository { pool, feed }
    }

    /// The latest `limit` entries, most recent date first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             ORDER BY transaction_date DESC, created_at DESC LIMIT ?1"
        );
        let entries = sqlx::query_as::<_, Transaction>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = entries.len(), "Listed recent transactions");
        Ok(entries)
    }

    /// Entries dated on or after `since`, oldest first.
    pub async fn list_since(&self, since: NaiveDate) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE transaction_date >= ?1 ORDER BY transaction_date ASC, created_at ASC"
        );
        let entries = sqlx::query_as::<_, Transaction>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn insert(&self, t: &Transaction) -> DbResult<Transaction> {
        debug!(id = %t.id, kind = ?t.transaction_type, amount = t.amount, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_type, description, amount, transaction_date, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&t.id)
        .bind(t.transaction_type)
        .bind(&t.description)
        .bind(t.amount)
        .bind(t.transaction_date)
        .bind(&t.created_by)
        .bind(t.created_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Table::Transactions, ChangeKind::Inserted, &t.id);
        Ok(t.clone())
    }
}

#[async_trait]
impl Fetch<Transaction> for TransactionRepository {
    async fn fetch(&self) -> DbResult<Vec<Transaction>> {
        self.list_recent(RECENT_LIMIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::{TimeZone, Utc};
    use filamento_core::{TransactionDraft, TransactionType};

    fn entry(kind: TransactionType, amount: i64, day: u32) -> Transaction {
        Transaction::from_draft(
            generate_id(),
            TransactionDraft {
                transaction_type: kind,
                description: format!("Movimiento {}", day),
                amount,
                transaction_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            },
            None,
            Utc.with_ymd_and_hms(2026, 3, 20, 9, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_recent_and_since() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.transactions();

        repo.insert(&entry(TransactionType::Income, 5000, 3)).await.unwrap();
        repo.insert(&entry(TransactionType::Expense, 1200, 12)).await.unwrap();
        repo.insert(&entry(TransactionType::Income, 800, 7)).await.unwrap();

        let recent = repo.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, 1200);
        assert_eq!(recent[0].transaction_type, TransactionType::Expense);
        assert_eq!(recent[1].amount, 800);

        let since = repo
            .list_since(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap())
            .await
            .unwrap();
        let amounts: Vec<i64> = since.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![800, 1200]);
    }

    #[tokio::test]
    async fn test_store_rejects_non_positive_amount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let result = db
            .transactions()
            .insert(&entry(TransactionType::Expense, 0, 1))
            .await;
        assert!(result.is_err());
    }
}
