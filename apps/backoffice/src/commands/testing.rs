//! Shared fixtures for command tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::state::{ConfigState, DbState, SessionManager};
use filamento_core::{Money, Product};
use filamento_db::repository::generate_id;
use filamento_db::{Database, DbConfig, LocalAuthProvider, ManualClock};

pub(crate) struct Harness {
    pub db: DbState,
    pub sessions: SessionManager,
    pub config: ConfigState,
    pub clock: ManualClock,
}

pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

/// In-memory store, nobody signed in.
pub(crate) async fn signed_out() -> Harness {
    let database = Database::new(DbConfig::in_memory()).await.unwrap();
    let clock = ManualClock::new(start());
    let provider = LocalAuthProvider::new(
        database.users(),
        "test-secret",
        Duration::hours(8),
        Arc::new(clock.clone()),
    );

    Harness {
        db: DbState::with_clock(database, Duration::seconds(30), Arc::new(clock.clone())),
        sessions: SessionManager::new(Arc::new(provider)),
        config: ConfigState::default(),
        clock,
    }
}

/// In-memory store with a signed-in account.
pub(crate) async fn signed_in() -> Harness {
    let h = signed_out().await;
    h.sessions
        .sign_up("taller@filamento.cl", "secreto123", "Taller")
        .await
        .unwrap();
    h
}

impl Harness {
    pub async fn product(&self, name: &str, cost: i64, price: i64, stock: i64) -> Product {
        let product = Product::manual(
            generate_id(),
            name,
            Money::from_units(cost),
            Money::from_units(price),
            stock,
            None,
            self.db.now(),
        );
        self.db.inner().products().insert(&product).await.unwrap()
    }

    /// Moves the clock past the session lifetime.
    pub fn expire_session(&self) {
        self.clock.advance(Duration::hours(9));
    }
}
