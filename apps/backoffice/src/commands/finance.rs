//! # Finance Commands
//!
//! The manual income/expense ledger. Entries are independent of sales and
//! immutable once recorded.

use tracing::info;

use crate::error::ApiError;
use crate::state::{DbState, SessionManager};
use filamento_core::aggregation::{self, FinanceSummary};
use filamento_core::validation::validate_transaction_draft;
use filamento_core::{Transaction, TransactionDraft};
use filamento_db::repository::generate_id;

pub async fn record_transaction(
    db: &DbState,
    sessions: &SessionManager,
    draft: TransactionDraft,
) -> Result<Transaction, ApiError> {
    validate_transaction_draft(&draft)?;
    let session = sessions.require_session().await?;

    let entry = Transaction::from_draft(generate_id(), draft, Some(session.user_id), db.now());
    let entry = db.inner().transactions().insert(&entry).await?;
    db.caches().transactions.invalidate();

    info!(
        transaction_id = %entry.id,
        kind = ?entry.transaction_type,
        amount = entry.amount,
        "Transaction recorded"
    );
    Ok(entry)
}

/// The 100 most recent entries, latest date first.
pub async fn list_transactions(db: &DbState) -> Result<Vec<Transaction>, ApiError> {
    Ok(db
        .cached(&db.caches().transactions, db.inner().transactions())
        .await?)
}

/// Totals over the same entries [`list_transactions`] returns.
pub async fn finance_summary(db: &DbState) -> Result<FinanceSummary, ApiError> {
    let entries = list_transactions(db).await?;
    Ok(aggregation::finance_summary(&entries))
}
