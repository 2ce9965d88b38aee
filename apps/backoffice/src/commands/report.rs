//! # Report Commands
//!
//! The three charts of the reports screen, read concurrently.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::DbState;
use filamento_core::aggregation::{
    self, trailing_window_start, CostCategoryAverage, MonthlyCashFlow, MonthlySales,
};
use filamento_core::TRAILING_MONTHS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    /// Income vs expense per month
    pub cash_flow: Vec<MonthlyCashFlow>,

    /// Revenue, real and suggested profit per month
    pub sales: Vec<MonthlySales>,

    /// Mean cost per category over every saved quotation
    pub cost_breakdown: Vec<CostCategoryAverage>,
}

pub async fn report_data(db: &DbState) -> Result<ReportData, ApiError> {
    let today = db.today();
    let since = trailing_window_start(today, TRAILING_MONTHS);
    let store = db.inner();

    let (transaction_repo, sale_repo, quotation_repo) =
        (store.transactions(), store.sales(), store.quotations());
    let (transactions, sales, quotations) = tokio::try_join!(
        transaction_repo.list_since(since),
        sale_repo.list_since(since),
        quotation_repo.list(),
    )?;

    Ok(ReportData {
        cash_flow: aggregation::monthly_cash_flow(&transactions, today),
        sales: aggregation::monthly_sales(&sales, today),
        cost_breakdown: aggregation::average_cost_breakdown(&quotations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{quotation, sale, testing};
    use chrono::NaiveDate;
    use filamento_core::SaleRequest;

    #[tokio::test]
    async fn test_empty_report() {
        let h = testing::signed_out().await;

        let report = report_data(&h.db).await.unwrap();
        assert!(report.cash_flow.is_empty());
        assert!(report.sales.is_empty());
        assert!(report.cost_breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_report_series() {
        let h = testing::signed_in().await;

        let mut form = quotation::new_quotation_form(&h.config);
        form.product_name = "Figura articulada".to_string();
        form.weight = "100".to_string();
        form.print_hours = "1".to_string();
        form.print_minutes = "30".to_string();
        form.material_cost_per_gram = "0.025".to_string();
        let saved = quotation::save_quotation_as_product(&h.db, &h.sessions, &form)
            .await
            .unwrap();
        crate::commands::product::add_stock(&h.db, &h.sessions, &saved.product.id, 5)
            .await
            .unwrap();

        for (quantity, day) in [(2, 3), (1, 10)] {
            sale::register_sale(
                &h.db,
                &h.sessions,
                SaleRequest {
                    product_id: saved.product.id.clone(),
                    quantity,
                    price_per_unit: 2309,
                    ..SaleRequest::default()
                },
                NaiveDate::from_ymd_opt(2026, 3, day),
            )
            .await
            .unwrap();
        }

        let report = report_data(&h.db).await.unwrap();

        assert_eq!(report.sales.len(), 1);
        let march = &report.sales[0];
        assert_eq!(march.month, "Mar");
        assert_eq!(march.ventas, 3 * 2309);
        assert_eq!(march.ganancia_real, 3 * (2309 - 485));
        // 30 % of 3 × 485
        assert_eq!(march.ganancia_sugerida, 437);

        let categories: Vec<_> = report
            .cost_breakdown
            .iter()
            .map(|c| (c.category.as_str(), c.costo))
            .collect();
        assert_eq!(
            categories,
            vec![("Material", 3), ("Energía", 32), ("Desgaste", 300), ("Mano de obra", 150)]
        );
    }
}
