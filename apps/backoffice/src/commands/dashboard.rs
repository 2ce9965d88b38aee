//! # Dashboard Commands
//!
//! ## Reads
//! ```text
//! dashboard(db)
//!     │
//!     ├── products.list_active ─────────┐
//!     ├── materials.list_visible ───────┤   concurrent, any order
//!     ├── sales.list_since(today-30d) ──┤
//!     └── transactions.list_since(6m) ──┘
//!                 │
//!                 ▼
//!     aggregation::dashboard_stats + monthly_cash_flow
//! ```
//!
//! Reads go straight to the store: the dashboard is opened rarely and its
//! windows differ from the list screens' snapshots.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use filamento_core::aggregation::{
    self, rolling_window_start, trailing_window_start, DashboardStats, MonthlyCashFlow,
};
use filamento_core::{DASHBOARD_WINDOW_DAYS, TRAILING_MONTHS};

/// Cards plus the income/expense chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub cash_flow: Vec<MonthlyCashFlow>,
}

/// The four dashboard cards.
pub async fn dashboard_stats(db: &DbState) -> Result<DashboardStats, ApiError> {
    let today = db.today();
    let store = db.inner();
    let since = rolling_window_start(today, DASHBOARD_WINDOW_DAYS);

    let (product_repo, material_repo, sale_repo) =
        (store.products(), store.materials(), store.sales());
    let (products, materials, sales) = tokio::try_join!(
        product_repo.list_active(),
        material_repo.list_visible(),
        sale_repo.list_since(since),
    )?;

    debug!(
        products = products.len(),
        materials = materials.len(),
        sales = sales.len(),
        "Computing dashboard stats"
    );
    Ok(aggregation::dashboard_stats(&products, &materials, &sales, today))
}

/// "Ingresos vs Egresos" over the trailing six months.
pub async fn cash_flow_chart(db: &DbState) -> Result<Vec<MonthlyCashFlow>, ApiError> {
    let today = db.today();
    let since = trailing_window_start(today, TRAILING_MONTHS);

    let entries = db.inner().transactions().list_since(since).await?;
    Ok(aggregation::monthly_cash_flow(&entries, today))
}

pub async fn dashboard(db: &DbState) -> Result<DashboardView, ApiError> {
    let (stats, cash_flow) = tokio::try_join!(dashboard_stats(db), cash_flow_chart(db))?;
    Ok(DashboardView { stats, cash_flow })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{finance, material, sale, testing};
    use chrono::{Duration, NaiveDate};
    use filamento_core::{MaterialDraft, Money, SaleRequest, TransactionDraft, TransactionType};

    #[tokio::test]
    async fn test_empty_store() {
        let h = testing::signed_out().await;

        let view = dashboard(&h.db).await.unwrap();
        assert_eq!(view.stats, DashboardStats::default());
        assert!(view.cash_flow.is_empty());
    }

    #[tokio::test]
    async fn test_stats_cover_last_30_days() {
        let h = testing::signed_in().await;
        let item = h.product("Figura articulada", 485, 2309, 10).await;
        h.product("Maceta", 1000, 3000, 4).await;

        let sell = |days_ago: i64| {
            let request = SaleRequest {
                product_id: item.id.clone(),
                quantity: 1,
                price_per_unit: 2500,
                ..SaleRequest::default()
            };
            (request, h.db.today() - Duration::days(days_ago))
        };

        for (request, date) in [sell(0), sell(30), sell(31)] {
            sale::register_sale(&h.db, &h.sessions, request, Some(date))
                .await
                .unwrap();
        }

        material::add_material(
            &h.db,
            &h.sessions,
            &h.config,
            MaterialDraft {
                name: "PETG Blanco".to_string(),
                material_type: "PETG".to_string(),
                quantity: 120.0,
                unit: "g".to_string(),
                unit_cost: 0.03,
                purchase_date: h.db.today(),
                supplier: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let stats = dashboard_stats(&h.db).await.unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_stock, 7 + 4);
        assert_eq!(stats.low_stock_materials, 1);
        assert_eq!(stats.sales_last_30_days, Money::from_units(5000));
        assert_eq!(stats.profit_last_30_days, Money::from_units(2 * (2500 - 485)));
    }

    #[tokio::test]
    async fn test_cash_flow_chart_groups_by_month() {
        let h = testing::signed_in().await;
        let entries = [
            (TransactionType::Income, 40_000, NaiveDate::from_ymd_opt(2026, 2, 10)),
            (TransactionType::Expense, 12_000, NaiveDate::from_ymd_opt(2026, 2, 20)),
            (TransactionType::Income, 25_000, NaiveDate::from_ymd_opt(2026, 3, 1)),
            (TransactionType::Income, 99_000, NaiveDate::from_ymd_opt(2025, 8, 1)),
        ];
        for (kind, amount, date) in entries {
            finance::record_transaction(
                &h.db,
                &h.sessions,
                TransactionDraft {
                    transaction_type: kind,
                    description: "Movimiento".to_string(),
                    amount,
                    transaction_date: date.unwrap(),
                },
            )
            .await
            .unwrap();
        }

        let chart = cash_flow_chart(&h.db).await.unwrap();
        let months: Vec<_> = chart.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["Feb", "Mar"]);
        assert_eq!((chart[0].income, chart[0].expense), (40_000, 12_000));
        assert_eq!((chart[1].income, chart[1].expense), (25_000, 0));
    }
}
