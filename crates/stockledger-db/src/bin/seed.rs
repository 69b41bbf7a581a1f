//! # Seed Data Generator
//!
//! Populates an empty database with a small lab inventory for development.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (stockledger.toml / STOCKLEDGER_DB_PATH)
//! cargo run -p stockledger-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockledger-db --bin seed -- --db ./data/stockledger.db
//! ```
//!
//! ## Generated Data
//! - Units: pcs, box, ream
//! - Users: one superadmin, one operator per lab
//! - Warehouses: one per lab, owned by its operator, plus an unowned store
//! - Items: assets (projectors, scopes) and consumables (paper, cables), with image paths
//! - One opening IN transaction per lab, booked through the ledger

use std::env;
use std::path::PathBuf;

use stockledger_core::{ItemCategory, NewLine, NewTransaction, Role, TransactionType};
use stockledger_db::{Database, LedgerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Labs, each with its own operator and warehouse.
const LABS: &[(&str, &str)] = &[
    ("Physics Lab", "Dina Operator"),
    ("Chemistry Lab", "Raka Operator"),
    ("Computer Lab", "Sari Operator"),
];

/// (code, name, category, unit, opening stock per lab)
const ITEMS: &[(&str, &str, ItemCategory, &str, i64)] = &[
    ("PRJ-EPSON-01", "Epson Projector EB-X06", ItemCategory::Asset, "pcs", 3),
    ("OSC-RIGOL-01", "Rigol Oscilloscope DS1054Z", ItemCategory::Asset, "pcs", 2),
    ("MTR-FLUKE-01", "Fluke Multimeter 117", ItemCategory::Asset, "pcs", 5),
    ("LAP-THINK-01", "ThinkPad Laptop E14", ItemCategory::Asset, "pcs", 4),
    ("CBL-HDMI-2M", "HDMI Cable 2m", ItemCategory::Consumable, "pcs", 20),
    ("PPR-A4-80", "Paper A4 80gsm", ItemCategory::Consumable, "ream", 15),
    ("GLV-NITR-M", "Nitrile Gloves M", ItemCategory::Consumable, "box", 10),
    ("BAT-AA-04", "AA Battery 4-pack", ItemCategory::Consumable, "box", 12),
];

const UNITS: &[&str] = &["pcs", "box", "ream"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: from config)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(None)?;
    if let Some(path) = db_path {
        config.database.path = PathBuf::from(path);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    println!("🌱 Stockledger Seed Data Generator");
    println!("==================================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing items
    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut unit_ids = Vec::with_capacity(UNITS.len());
    for name in UNITS {
        let unit = db.items().create_unit(name).await?;
        unit_ids.push((*name, unit.id));
    }
    println!("✓ Created {} units", unit_ids.len());

    let admin = db.users().create("Lab Administrator", Role::Superadmin).await?;
    db.warehouses().create("Central Store", None).await?;
    println!("✓ Created superadmin {}", admin.name);

    for (code, name, category, unit, _) in ITEMS {
        let unit_id = unit_ids
            .iter()
            .find(|(unit_name, _)| unit_name == unit)
            .map(|(_, id)| id.as_str());
        let item = db.items().create(code, name, *category, unit_id).await?;
        let image = format!("items/{}.jpg", code.to_lowercase());
        db.items().set_image_path(&item.id, Some(&image)).await?;
    }
    println!("✓ Registered {} items with images", ITEMS.len());

    println!();
    println!("Booking opening stock...");

    let mut booked = 0;
    let mut operators = Vec::with_capacity(LABS.len());
    for (lab, operator_name) in LABS {
        let operator = db.users().create(operator_name, Role::Operator).await?;
        let warehouse = db.warehouses().create(lab, Some(&operator.id)).await?;
        operators.push(operator.clone());

        let request = NewTransaction {
            transaction_type: TransactionType::In,
            description: Some(format!("Opening stock for {}", warehouse.name)),
            warehouse_id: None,
            lines: ITEMS
                .iter()
                .map(|(code, _, _, _, quantity)| NewLine {
                    item_code: code.to_string(),
                    quantity: *quantity,
                    description: None,
                })
                .collect(),
        };

        match db.ledger().create_transaction(&operator.id, request).await {
            Ok(record) => {
                booked += 1;
                info!(code = %record.transaction.code, warehouse = %warehouse.name, "Opening stock booked");
                println!("  {} → {} ({} lines)", warehouse.name, record.transaction.code, record.lines.len());
            }
            Err(e) => {
                warn!(warehouse = %warehouse.name, error = %e, "Opening stock failed");
                eprintln!("Failed to book opening stock for {}: {}", warehouse.name, e);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Booked {} opening transactions in {:?}", booked, elapsed);

    // Verify balances per bound warehouse
    println!();
    println!("Verifying balances...");
    for operator in &operators {
        let Some(warehouse) = db.warehouses().get_bound_to(&operator.id).await? else {
            warn!(operator = %operator.name, "Operator has no bound warehouse");
            continue;
        };
        let rows = db.balances().list_for_warehouse(&warehouse.id).await?;
        let units: i64 = rows.iter().map(|b| b.available).sum();
        println!("  {} ({}): {} items, {} units available", warehouse.name, operator.name, rows.len(), units);
    }

    // Verify lookup
    println!();
    println!("Verifying scanner lookup...");
    if let Some(operator) = operators.first() {
        let scanned = db.ledger().lookup(ITEMS[0].0, Some(&operator.id)).await?;
        println!(
            "  Lookup '{}': {} available ({})",
            scanned.code,
            scanned.available_stock,
            scanned.unit_name.as_deref().unwrap_or("-")
        );
        println!("  Scanner payload: {}", serde_json::to_string(&scanned)?);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
