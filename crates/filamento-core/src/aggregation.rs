//! # Aggregation
//!
//! Turns lists of dated records into the series and cards shown on the
//! dashboard, finance and report screens.
//!
//! ## Month Bucketing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Records are bucketed by MONTH-OF-YEAR label only:                      │
//! │                                                                         │
//! │    2025-03-10 ──┐                                                       │
//! │                 ├──► "Mar"                                              │
//! │    2026-03-02 ──┘                                                       │
//! │                                                                         │
//! │  Within a 6-month window this never collides in practice, but a        │
//! │  longer input WILL merge March of two years into one bucket.           │
//! │                                                                         │
//! │  Bucket order = first appearance in the date-ascending input.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: slices in, fresh values out. Windows are
//! computed from an explicit `today`, never from the system clock.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Material, Product, Quotation, Sale, Transaction, TransactionType};
use crate::{DASHBOARD_WINDOW_DAYS, SUGGESTED_PROFIT_RATIO, TRAILING_MONTHS};

/// Spanish month abbreviations, January first.
///
/// December is `Dic` on every chart, the dashboard's included.
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Label of the month a date falls in.
pub fn month_label(date: NaiveDate) -> &'static str {
    MONTH_LABELS[date.month0() as usize]
}

/// First day included in a trailing window of `months` months.
///
/// The day of month carries over into the next month when the target
/// month is shorter: 31 Aug minus 6 months is 3 Mar (2 Mar in leap years).
pub fn trailing_window_start(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(months)))
        .and_then(|first| first.checked_add_signed(Duration::days(i64::from(today.day0()))))
        .unwrap_or(NaiveDate::MIN)
}

/// First day included in the dashboard's rolling window.
pub fn rolling_window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MIN)
}

// =============================================================================
// Output Types
// =============================================================================

/// One bar pair of the "Ingresos vs Egresos" chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyCashFlow {
    pub month: String,
    #[serde(rename = "ingresos")]
    pub income: i64,
    #[serde(rename = "egresos")]
    pub expense: i64,
}

/// One point of the monthly sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    pub month: String,
    pub ventas: i64,
    pub ganancia_real: i64,
    pub ganancia_sugerida: i64,
}

/// Average of one cost category across all quotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostCategoryAverage {
    pub category: String,
    pub costo: i64,
}

/// The four cards at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_stock: i64,
    pub low_stock_materials: i64,
    pub sales_last_30_days: Money,
    pub profit_last_30_days: Money,
}

/// Header of the finance screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinanceSummary {
    pub total_income: Money,
    pub total_expense: Money,
    pub net_balance: Money,
}

// =============================================================================
// Monthly Series
// =============================================================================

/// Groups `items` into month buckets in first-appearance order.
///
/// Items are visited in ascending date order (stable for equal dates).
fn bucket_by_month<'a, T, A: Default>(
    items: impl IntoIterator<Item = &'a T>,
    date_of: impl Fn(&T) -> NaiveDate,
    mut fold: impl FnMut(&mut A, &T),
) -> Vec<(&'static str, A)>
where
    T: 'a,
{
    let mut ordered: Vec<&T> = items.into_iter().collect();
    ordered.sort_by_key(|item| date_of(*item));

    let mut buckets: Vec<(&'static str, A)> = Vec::new();
    for item in ordered {
        let label = month_label(date_of(item));
        let idx = match buckets.iter().position(|(l, _)| *l == label) {
            Some(idx) => idx,
            None => {
                buckets.push((label, A::default()));
                buckets.len() - 1
            }
        };
        fold(&mut buckets[idx].1, item);
    }
    buckets
}

/// Income and expense per month over the trailing six months.
pub fn monthly_cash_flow(transactions: &[Transaction], today: NaiveDate) -> Vec<MonthlyCashFlow> {
    let since = trailing_window_start(today, TRAILING_MONTHS);

    bucket_by_month(
        transactions.iter().filter(|t| t.transaction_date >= since),
        |t: &Transaction| t.transaction_date,
        |acc: &mut (i64, i64), t: &Transaction| match t.transaction_type {
            TransactionType::Income => acc.0 += t.amount,
            TransactionType::Expense => acc.1 += t.amount,
        },
    )
    .into_iter()
    .map(|(month, (income, expense))| MonthlyCashFlow {
        month: month.to_string(),
        income,
        expense,
    })
    .collect()
}

/// Revenue, real profit and suggested profit per month over the trailing
/// six months.
///
/// Suggested profit is a flat 30 % of each sale's total cost.
pub fn monthly_sales(sales: &[Sale], today: NaiveDate) -> Vec<MonthlySales> {
    let since = trailing_window_start(today, TRAILING_MONTHS);

    bucket_by_month(
        sales.iter().filter(|s| s.sale_date >= since),
        |s: &Sale| s.sale_date,
        |acc: &mut (f64, f64, f64), s: &Sale| {
            acc.0 += s.total_amount as f64;
            acc.1 += s.profit as f64;
            acc.2 += s.total_cost as f64 * SUGGESTED_PROFIT_RATIO;
        },
    )
    .into_iter()
    .map(|(month, (ventas, real, sugerida))| MonthlySales {
        month: month.to_string(),
        ventas: Money::round_from(ventas).units(),
        ganancia_real: Money::round_from(real).units(),
        ganancia_sugerida: Money::round_from(sugerida).units(),
    })
    .collect()
}

// =============================================================================
// Averages
// =============================================================================

/// Mean cost per category across every quotation.
///
/// Returns an empty series when there are no quotations.
pub fn average_cost_breakdown(quotations: &[Quotation]) -> Vec<CostCategoryAverage> {
    if quotations.is_empty() {
        return Vec::new();
    }

    let n = quotations.len() as f64;
    let mean = |f: fn(&Quotation) -> i64| {
        let sum: i64 = quotations.iter().map(f).sum();
        Money::round_from(sum as f64 / n).units()
    };

    vec![
        CostCategoryAverage {
            category: "Material".to_string(),
            costo: mean(|q| q.material_cost),
        },
        CostCategoryAverage {
            category: "Energía".to_string(),
            costo: mean(|q| q.energy_cost),
        },
        CostCategoryAverage {
            category: "Desgaste".to_string(),
            costo: mean(|q| q.wear_cost),
        },
        CostCategoryAverage {
            category: "Mano de obra".to_string(),
            costo: mean(|q| q.labor_cost),
        },
    ]
}

// =============================================================================
// Cards
// =============================================================================

/// Dashboard cards.
///
/// Product figures count active products only. Sales are limited to the
/// last 30 days, inclusive of the boundary day.
pub fn dashboard_stats(
    products: &[Product],
    materials: &[Material],
    sales: &[Sale],
    today: NaiveDate,
) -> DashboardStats {
    let since = rolling_window_start(today, DASHBOARD_WINDOW_DAYS);
    let active = products.iter().filter(|p| p.is_active);
    let recent = || sales.iter().filter(move |s| s.sale_date >= since);

    DashboardStats {
        total_products: active.clone().count() as i64,
        total_stock: active.map(|p| p.stock).sum(),
        low_stock_materials: materials.iter().filter(|m| m.status.is_low_stock()).count() as i64,
        sales_last_30_days: recent().map(Sale::total_amount).sum(),
        profit_last_30_days: recent().map(Sale::profit).sum(),
    }
}

/// Income, expense and balance over a list of transactions.
pub fn finance_summary(transactions: &[Transaction]) -> FinanceSummary {
    let total = |kind: TransactionType| -> Money {
        transactions
            .iter()
            .filter(|t| t.transaction_type == kind)
            .map(Transaction::amount)
            .sum()
    };

    let total_income = total(TransactionType::Income);
    let total_expense = total(TransactionType::Expense);

    FinanceSummary {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MaterialStatus;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionType, amount: i64, on: NaiveDate) -> Transaction {
        Transaction {
            id: format!("t-{}-{}", on, amount),
            transaction_type: kind,
            description: "mov".to_string(),
            amount,
            transaction_date: on,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn sale(total_amount: i64, total_cost: i64, on: NaiveDate) -> Sale {
        Sale {
            id: format!("s-{}-{}", on, total_amount),
            product_id: "p-1".to_string(),
            product_name: "Figura".to_string(),
            quantity: 1,
            price_per_unit: total_amount,
            total_amount,
            cost_per_unit: total_cost,
            total_cost,
            profit: total_amount - total_cost,
            payment_method: None,
            client_name: None,
            client_email: None,
            client_phone: None,
            notes: None,
            created_by: None,
            sale_date: on,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn quotation(material: i64, energy: i64, wear: i64, labor: i64) -> Quotation {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Quotation {
            id: "q".to_string(),
            product_name: "q".to_string(),
            weight_grams: 0.0,
            print_time_hours: 0.0,
            print_time_minutes: 0.0,
            material_cost_per_gram: 0.0,
            machine_power_watts: 0.0,
            energy_cost_per_kwh: 0.0,
            wear_cost_per_hour: 0.0,
            labor_cost_per_hour: 0.0,
            tax_percent: 0.0,
            margin_percent: 0.0,
            material_cost: material,
            energy_cost: energy,
            wear_cost: wear,
            labor_cost: labor,
            subtotal: material + energy + wear + labor,
            margin_amount: 0,
            tax_amount: 0,
            final_price: 0,
            machine_id: None,
            created_by: None,
            saved_as_product: false,
            product_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_month_labels() {
        assert_eq!(month_label(date(2026, 1, 5)), "Ene");
        assert_eq!(month_label(date(2026, 12, 31)), "Dic");
    }

    #[test]
    fn test_trailing_window_rolls_past_short_months() {
        assert_eq!(trailing_window_start(date(2026, 8, 31), 6), date(2026, 3, 3));
        assert_eq!(trailing_window_start(date(2028, 8, 31), 6), date(2028, 3, 2));
        assert_eq!(trailing_window_start(date(2026, 8, 28), 6), date(2026, 2, 28));
        assert_eq!(trailing_window_start(date(2026, 1, 31), 6), date(2025, 7, 31));
        assert_eq!(trailing_window_start(date(2026, 3, 15), 6), date(2025, 9, 15));
        assert_eq!(rolling_window_start(date(2026, 3, 15), 30), date(2026, 2, 13));
    }

    #[test]
    fn test_cash_flow_groups_in_first_appearance_order() {
        let today = date(2026, 3, 20);
        let txs = vec![
            tx(TransactionType::Expense, 400, date(2026, 3, 1)),
            tx(TransactionType::Income, 1000, date(2026, 1, 10)),
            tx(TransactionType::Income, 500, date(2026, 3, 5)),
            tx(TransactionType::Expense, 200, date(2026, 1, 15)),
            tx(TransactionType::Income, 9999, date(2025, 6, 1)),
        ];

        let series = monthly_cash_flow(&txs, today);

        assert_eq!(
            series,
            vec![
                MonthlyCashFlow {
                    month: "Ene".to_string(),
                    income: 1000,
                    expense: 200
                },
                MonthlyCashFlow {
                    month: "Mar".to_string(),
                    income: 500,
                    expense: 400
                },
            ]
        );
    }

    #[test]
    fn test_cash_flow_merges_same_month_of_different_years() {
        let txs = vec![
            tx(TransactionType::Income, 100, date(2025, 3, 1)),
            tx(TransactionType::Income, 50, date(2026, 3, 1)),
        ];
        let buckets = bucket_by_month(
            txs.iter(),
            |t: &Transaction| t.transaction_date,
            |acc: &mut i64, t: &Transaction| *acc += t.amount,
        );
        assert_eq!(buckets, vec![("Mar", 150)]);
    }

    #[test]
    fn test_monthly_series_are_idempotent_and_empty_safe() {
        let today = date(2026, 3, 20);
        assert!(monthly_cash_flow(&[], today).is_empty());
        assert!(monthly_sales(&[], today).is_empty());

        let sales = vec![sale(2000, 485, date(2026, 2, 1)), sale(3000, 970, date(2026, 3, 2))];
        assert_eq!(monthly_sales(&sales, today), monthly_sales(&sales, today));
    }

    #[test]
    fn test_monthly_sales_rounds_suggested_profit() {
        let today = date(2026, 3, 20);
        let sales = vec![sale(2000, 485, date(2026, 3, 1)), sale(1000, 1, date(2026, 3, 2))];

        let series = monthly_sales(&sales, today);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].ventas, 3000);
        assert_eq!(series[0].ganancia_real, 2514);
        // (485 + 1) × 0.3 = 145.8
        assert_eq!(series[0].ganancia_sugerida, 146);

        let json = serde_json::to_value(&series[0]).unwrap();
        assert!(json.get("gananciaSugerida").is_some());
    }

    #[test]
    fn test_average_cost_breakdown() {
        assert!(average_cost_breakdown(&[]).is_empty());

        let qs = vec![quotation(3, 32, 300, 150), quotation(4, 33, 301, 151)];
        let avg = average_cost_breakdown(&qs);

        let costs: Vec<i64> = avg.iter().map(|c| c.costo).collect();
        assert_eq!(costs, vec![4, 33, 301, 151]);
        assert_eq!(avg[1].category, "Energía");
    }

    #[test]
    fn test_dashboard_stats() {
        let now = Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap();
        let today = now.date_naive();

        let mut inactive = Product::manual(
            "p-2".to_string(),
            "Vieja",
            Money::from_units(100),
            Money::from_units(300),
            50,
            None,
            now,
        );
        inactive.is_active = false;
        let products = vec![
            Product::manual(
                "p-1".to_string(),
                "Maceta",
                Money::from_units(485),
                Money::from_units(2309),
                7,
                None,
                now,
            ),
            inactive,
        ];

        let material = |status| Material {
            id: "m".to_string(),
            name: "PLA".to_string(),
            material_type: "PLA".to_string(),
            quantity: 0.0,
            unit: "g".to_string(),
            unit_cost: 0.0,
            status,
            purchase_date: today,
            supplier: None,
            notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        let materials = vec![
            material(MaterialStatus::Active),
            material(MaterialStatus::Low),
            material(MaterialStatus::Out),
            material(MaterialStatus::Inactive),
        ];

        let sales = vec![
            sale(2000, 485, date(2026, 2, 18)),
            sale(3000, 970, date(2026, 3, 19)),
            sale(9000, 100, date(2026, 2, 17)),
        ];

        let stats = dashboard_stats(&products, &materials, &sales, today);

        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_stock, 7);
        assert_eq!(stats.low_stock_materials, 2);
        assert_eq!(stats.sales_last_30_days.units(), 5000);
        assert_eq!(stats.profit_last_30_days.units(), 3545);
    }

    #[test]
    fn test_finance_summary() {
        let day = date(2026, 3, 1);
        let txs = vec![
            tx(TransactionType::Income, 10_000, day),
            tx(TransactionType::Expense, 2_500, day),
            tx(TransactionType::Expense, 10_000, day),
        ];

        let summary = finance_summary(&txs);
        assert_eq!(summary.total_income.units(), 10_000);
        assert_eq!(summary.total_expense.units(), 12_500);
        assert_eq!(summary.net_balance.units(), -2_500);
    }
}
