//! # Change Feed
//!
//! Per-table change notifications, published by the repositories after each
//! successful write.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Change Feed                                     │
//! │                                                                         │
//! │  ProductRepository::add_stock ──► publish(Products, Updated, id)        │
//! │                                        │                                │
//! │                           tokio::sync::broadcast                        │
//! │                       ┌────────────────┼────────────────┐               │
//! │                       ▼                ▼                ▼               │
//! │              LiveCollection     LiveCollection     any subscriber       │
//! │               (products)         (sales: ignores)                       │
//! │                                                                         │
//! │  Publishing with no subscribers is not an error.                        │
//! │  A slow subscriber may lag and lose notifications; it sees              │
//! │  RecvError::Lagged and should refetch.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the shared broadcast channel.
const FEED_CAPACITY: usize = 256;

/// Tables that publish change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Machines,
    Materials,
    Quotations,
    Products,
    StockMovements,
    Sales,
    Transactions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Machines => "machines",
            Table::Materials => "materials",
            Table::Quotations => "quotations",
            Table::Products => "products",
            Table::StockMovements => "stock_movements",
            Table::Sales => "sales",
            Table::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inserted,
    Updated,
    /// Soft delete; the row is still there.
    Deleted,
}

/// One row change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: String,
}

/// Broadcast hub for [`TableChange`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<TableChange>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        ChangeFeed { sender }
    }

    /// Publishes a change to every current subscriber.
    pub fn publish(&self, table: Table, kind: ChangeKind, id: impl Into<String>) {
        let change = TableChange {
            table,
            kind,
            id: id.into(),
        };
        trace!(table = %change.table, kind = ?change.kind, id = %change.id, "Publishing change");
        // Err only means nobody is listening.
        let _ = self.sender.send(change);
    }

    /// Subscribes to changes of every table.
    pub fn subscribe_all(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }

    /// Subscribes to changes of one table.
    pub fn subscribe(&self, table: Table) -> TableSubscription {
        TableSubscription {
            table,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new()
    }
}

/// What a [`TableSubscription`] yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Changed(TableChange),
    /// Some notifications were dropped; the subscriber's view may be stale.
    Lagged(u64),
}

/// A receiver filtered to one table.
#[derive(Debug)]
pub struct TableSubscription {
    table: Table,
    receiver: broadcast::Receiver<TableChange>,
}

impl TableSubscription {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Waits for the next change of this table.
    ///
    /// Returns `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.table == self.table => return Some(FeedEvent::Changed(change)),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => return Some(FeedEvent::Lagged(n)),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
