//! # Seed Data Generator
//!
//! Populates a database with the standard price columns and price levels
//! for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./treadstock_dev.db)
//! cargo run -p treadstock-db --bin seed
//!
//! # Specify database path
//! cargo run -p treadstock-db --bin seed -- --db ./data/treadstock.db
//! ```
//!
//! ## Seeded Columns
//! - lista (fixed)      - list price, created by the initial migration
//! - efectivo (fixed)   - cash price
//! - empresa (fixed)    - company tier
//! - mayoreo (fixed)    - wholesale tier
//! - mayoreo_3 (derived) - wholesale minus 3%
//! - mayoreo_6 (derived) - wholesale minus 6%
//! - lista_10 (derived)  - list minus 10%
//!
//! ## Seeded Levels
//! - public       → lista
//! - empresa      → empresa (reference: lista)
//! - distribuidor → mayoreo (reference: lista)
//! - mayorista    → mayoreo_6 (reference: lista)

use std::env;

use chrono::Utc;
use treadstock_core::{PriceColumn, PriceColumnMode, PriceLevel, PriceOperation};
use treadstock_db::{Database, DbConfig};

struct ColumnSeed {
    code: &'static str,
    name: &'static str,
    visual_order: i64,
    is_public: bool,
    mode: PriceColumnMode,
    base_code: Option<&'static str>,
    operation: Option<PriceOperation>,
    amount: Option<f64>,
}

const COLUMN_SEEDS: &[ColumnSeed] = &[
    ColumnSeed {
        code: "efectivo",
        name: "Precio de contado",
        visual_order: 1,
        is_public: false,
        mode: PriceColumnMode::Fixed,
        base_code: None,
        operation: None,
        amount: None,
    },
    ColumnSeed {
        code: "empresa",
        name: "Precio empresa",
        visual_order: 2,
        is_public: false,
        mode: PriceColumnMode::Fixed,
        base_code: None,
        operation: None,
        amount: None,
    },
    ColumnSeed {
        code: "mayoreo",
        name: "Precio mayoreo",
        visual_order: 3,
        is_public: false,
        mode: PriceColumnMode::Fixed,
        base_code: None,
        operation: None,
        amount: None,
    },
    ColumnSeed {
        code: "mayoreo_3",
        name: "Mayoreo -3%",
        visual_order: 4,
        is_public: false,
        mode: PriceColumnMode::Derived,
        base_code: Some("mayoreo"),
        operation: Some(PriceOperation::Percent),
        amount: Some(3.0),
    },
    ColumnSeed {
        code: "mayoreo_6",
        name: "Mayoreo -6%",
        visual_order: 5,
        is_public: false,
        mode: PriceColumnMode::Derived,
        base_code: Some("mayoreo"),
        operation: Some(PriceOperation::Percent),
        amount: Some(6.0),
    },
    ColumnSeed {
        code: "lista_10",
        name: "Lista -10%",
        visual_order: 6,
        is_public: false,
        mode: PriceColumnMode::Derived,
        base_code: Some("lista"),
        operation: Some(PriceOperation::Percent),
        amount: Some(10.0),
    },
];

struct LevelSeed {
    code: &'static str,
    name: &'static str,
    price_column: &'static str,
    reference_column: Option<&'static str>,
}

const LEVEL_SEEDS: &[LevelSeed] = &[
    LevelSeed {
        code: "public",
        name: "Público",
        price_column: "lista",
        reference_column: None,
    },
    LevelSeed {
        code: "empresa",
        name: "Empresa",
        price_column: "empresa",
        reference_column: Some("lista"),
    },
    LevelSeed {
        code: "distribuidor",
        name: "Distribuidor",
        price_column: "mayoreo",
        reference_column: Some("lista"),
    },
    LevelSeed {
        code: "mayorista",
        name: "Mayorista",
        price_column: "mayoreo_6",
        reference_column: Some("lista"),
    },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./treadstock_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Treadstock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./treadstock_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Treadstock Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let now = Utc::now();
    let columns = db.price_columns();
    let mut created_columns = 0;

    for seed in COLUMN_SEEDS {
        if columns.get_by_code(seed.code).await?.is_some() {
            continue;
        }

        columns
            .insert(&PriceColumn {
                id: 0,
                code: seed.code.to_string(),
                name: seed.name.to_string(),
                description: String::new(),
                visual_order: seed.visual_order,
                active: true,
                is_public: seed.is_public,
                mode: seed.mode,
                base_code: seed.base_code.map(str::to_string),
                operation: seed.operation,
                amount: seed.amount,
                created_at: now,
                updated_at: now,
            })
            .await?;
        created_columns += 1;
    }

    println!("✓ Price columns ready ({} created)", created_columns);

    let levels = db.price_levels();
    let mut created_levels = 0;

    for seed in LEVEL_SEEDS {
        if levels.get_by_code(seed.code).await?.is_some() {
            continue;
        }

        levels
            .insert(&PriceLevel {
                id: 0,
                code: seed.code.to_string(),
                name: seed.name.to_string(),
                description: None,
                discount_percentage: 0.0,
                price_column: seed.price_column.to_string(),
                reference_column: seed.reference_column.map(str::to_string),
                can_view_offers: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
        created_levels += 1;
    }

    println!("✓ Price levels ready ({} created)", created_levels);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
