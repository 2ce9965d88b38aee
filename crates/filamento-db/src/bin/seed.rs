//! # Seed Data Generator
//!
//! Populates the database with a demo 3D-printing shop for development.
//!
//! ## Usage
//! ```bash
//! # Six months of history (default)
//! cargo run -p filamento-db --bin seed
//!
//! # Longer history
//! cargo run -p filamento-db --bin seed -- --months 12
//!
//! # Specify database path
//! cargo run -p filamento-db --bin seed -- --db ./data/filamento.db
//! ```
//!
//! ## Generated Data
//! - Two printers
//! - A handful of filament and resin rolls, one of them running low
//! - One quotation per catalog item, each saved as a product
//! - Stock for every product
//! - A few sales per month and the matching income/expense entries
//!
//! Values are derived from the loop indices, so two runs produce the same
//! numbers.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use std::env;

use filamento_core::quotation::calculate;
use filamento_core::{
    Machine, Material, MaterialDraft, MaterialStatus, Product, Quotation, QuotationDefaults,
    QuotationInput, Sale, SaleRequest, Transaction, TransactionDraft, TransactionType,
};
use filamento_db::repository::generate_id;
use filamento_db::{Database, DbConfig};

/// Grams at or below which a material is flagged as low.
const LOW_STOCK_GRAMS: f64 = 200.0;

/// Printers: (name, model, watts)
const MACHINES: &[(&str, &str, f64)] = &[
    ("Prusa MK4", "MK4", 150.0),
    ("Bambu P1S", "P1S", 350.0),
];

/// Materials: (name, type, grams, cost per gram)
const MATERIALS: &[(&str, &str, f64, f64)] = &[
    ("PLA Negro 1kg", "PLA", 2000.0, 18.0),
    ("PLA Blanco 1kg", "PLA", 850.0, 18.0),
    ("PETG Transparente", "PETG", 150.0, 24.0),
    ("TPU Flexible", "TPU", 500.0, 32.0),
    ("Resina Gris", "Resina", 0.0, 45.0),
];

/// Catalog: (name, grams, hours, minutes)
const CATALOG: &[(&str, f64, f64, f64)] = &[
    ("Maceta geométrica", 120.0, 5.0, 30.0),
    ("Soporte de celular", 45.0, 2.0, 10.0),
    ("Llavero personalizado", 8.0, 0.0, 35.0),
    ("Organizador de escritorio", 210.0, 9.0, 0.0),
    ("Figura articulada", 60.0, 4.0, 45.0),
];

const PAYMENT_METHODS: &[&str] = &["efectivo", "transferencia", "débito"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut months: u32 = 6;
    let mut db_path = String::from("./filamento_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Filamento Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --months <N>   Months of sales history (default: 6)");
                println!("  -d, --db <PATH>    Database file path (default: ./filamento_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Filamento Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("History:  {} months", months);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();
    let defaults = QuotationDefaults::default();

    // Machines
    let mut machines = Vec::new();
    for (name, model, watts) in MACHINES {
        let machine = Machine {
            id: generate_id(),
            name: name.to_string(),
            model: Some(model.to_string()),
            power_consumption_watts: *watts,
            is_active: true,
            purchase_date: today.checked_sub_months(Months::new(18)),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        machines.push(db.machines().insert(&machine).await?);
    }
    println!("✓ {} machines", machines.len());

    // Materials
    for (name, kind, grams, cost) in MATERIALS {
        let draft = MaterialDraft {
            name: name.to_string(),
            material_type: kind.to_string(),
            quantity: *grams,
            unit: "g".to_string(),
            unit_cost: *cost,
            purchase_date: today - Duration::days(20),
            supplier: Some("Filamentos del Sur".to_string()),
            notes: None,
        };
        let status = MaterialStatus::for_quantity(*grams, LOW_STOCK_GRAMS);
        db.materials()
            .insert(&Material::from_draft(generate_id(), draft, status, None, now))
            .await?;
    }
    println!("✓ {} materials", MATERIALS.len());

    // Quotations saved as products, with stock
    let mut products = Vec::new();
    for (idx, (name, grams, hours, minutes)) in CATALOG.iter().enumerate() {
        let machine = &machines[idx % machines.len()];
        let input = QuotationInput {
            product_name: name.to_string(),
            weight_grams: *grams,
            print_hours: *hours,
            print_minutes: *minutes,
            material_cost_per_gram: MATERIALS[idx % 2].3,
            machine_power_watts: machine.power_consumption_watts,
            energy_cost_per_kwh: defaults.energy_cost_per_kwh,
            wear_cost_per_hour: defaults.wear_cost_per_hour,
            labor_cost_per_hour: defaults.labor_cost_per_hour,
            tax_percent: defaults.tax_percent,
            margin_percent: defaults.margin_percent,
        };
        let result = calculate(&input);

        let quotation = Quotation::new(
            generate_id(),
            &input,
            &result,
            Some(machine.id.clone()),
            None,
            now,
        );
        db.quotations().insert(&quotation).await?;

        let product = Product::from_quotation(generate_id(), &quotation, None, now);
        db.products().insert(&product).await?;
        db.quotations()
            .mark_saved_as_product(&quotation.id, &product.id, now)
            .await?;

        let stocked = db
            .products()
            .add_stock(&product.id, 20 + (idx as i64) * 5, None, now)
            .await?;
        products.push(stocked);
    }
    println!("✓ {} quotations saved as products", products.len());

    // Sales and ledger entries, one batch per month
    let mut sales = 0;
    let mut entries = 0;
    for month_back in (0..months).rev() {
        let Some(month_start) = first_of_month(today, month_back) else {
            continue;
        };

        for slot in 0..3usize {
            let seed = (month_back as usize) * 3 + slot;
            let idx = seed % products.len();
            let Some(product) = db.products().get_by_id(&products[idx].id).await? else {
                continue;
            };

            let quantity = 1 + (seed % 3) as i64;
            if product.stock < quantity {
                continue;
            }

            let sale_date = clamp_to_today(month_start + Duration::days((slot * 9) as i64), today);
            let request = SaleRequest {
                product_id: product.id.clone(),
                quantity,
                price_per_unit: product.suggested_price,
                payment_method: Some(PAYMENT_METHODS[seed % PAYMENT_METHODS.len()].to_string()),
                ..Default::default()
            };

            let sale = Sale::record(generate_id(), &product, &request, None, sale_date, now)?;
            db.sales().record(&sale).await?;
            sales += 1;

            let income = TransactionDraft {
                transaction_type: TransactionType::Income,
                description: format!("Venta {}", sale.product_name),
                amount: sale.total_amount,
                transaction_date: sale_date,
            };
            db.transactions()
                .insert(&Transaction::from_draft(generate_id(), income, None, now))
                .await?;
            entries += 1;
        }

        let expense = TransactionDraft {
            transaction_type: TransactionType::Expense,
            description: "Compra de filamento".to_string(),
            amount: 15_000 + (month_back as i64) * 1_000,
            transaction_date: clamp_to_today(month_start + Duration::days(2), today),
        };
        db.transactions()
            .insert(&Transaction::from_draft(generate_id(), expense, None, now))
            .await?;
        entries += 1;
    }
    println!("✓ {} sales", sales);
    println!("✓ {} income/expense entries", entries);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// First day of the month `back` months before `today`.
fn first_of_month(today: NaiveDate, back: u32) -> Option<NaiveDate> {
    today
        .with_day(1)
        .and_then(|d| d.checked_sub_months(Months::new(back)))
}

fn clamp_to_today(date: NaiveDate, today: NaiveDate) -> NaiveDate {
    date.min(today)
}
