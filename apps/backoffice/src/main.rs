//! # Filamento Report
//!
//! Opens the configured database and prints the dashboard and report
//! figures as JSON.
//!
//! ## Usage
//! ```bash
//! # Default data directory
//! filamento-backoffice
//!
//! # Seeded demo database
//! cargo run --bin seed -- --db ./demo.db
//! FILAMENTO_DB_PATH=./demo.db filamento-backoffice
//! ```

use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};

use filamento_backoffice::commands::dashboard::{self, DashboardView};
use filamento_backoffice::commands::report::{self, ReportData};
use filamento_backoffice::config::AppConfig;
use filamento_backoffice::{init_tracing, App};
use filamento_core::aggregation::FinanceSummary;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    generated_on: String,
    dashboard: DashboardView,
    finance: FinanceSummary,
    report: ReportData,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let app = App::open(&config).await?;

    let (dashboard, finance, report) = tokio::try_join!(
        dashboard::dashboard(&app.db),
        filamento_backoffice::commands::finance::finance_summary(&app.db),
        report::report_data(&app.db),
    )?;

    info!(
        products = dashboard.stats.total_products,
        sales = %app.config.format_currency(dashboard.stats.sales_last_30_days),
        "Report generated"
    );

    let output = Output {
        generated_on: app.db.today().to_string(),
        dashboard,
        finance,
        report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    app.db.inner().close().await;
    Ok(())
}
