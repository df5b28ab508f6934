//! Spreadsheet import/export flows.

mod common;

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Reader, Xlsx};
use common::*;
use rust_xlsxwriter::Workbook;
use treadstock_service::{CatalogService, ServiceError};

/// Builds an XLSX payload with one header row and string cells.
fn build_sheet(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Catalog").unwrap();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32 + 1, col as u16, *value)
                .unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn xlsx_import_creates_tires_prices_and_inventory() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();
    catalog
        .create_column(derived_column("mayoreo_6", "mayoreo", "percent", 6.0))
        .await
        .unwrap();

    let payload = build_sheet(
        &[
            "sku", "brand", "model", "width", "profile", "rim", "quantity", "lista", "mayoreo",
        ],
        &[vec![
            "IMP-001", "Hankook", "VENTUS PRIME", "225", "45", "17", "12", "2500", "2200",
        ]],
    );

    let processed = catalog.import_from_xlsx(&payload).await.unwrap();
    assert_eq!(processed, 1);

    let tire = catalog.get("IMP-001").await.unwrap();
    assert_eq!(tire.model, "VENTUS PRIME");
    assert_eq!(tire.width, 225);
    assert_eq!(tire.profile, Some(45));
    assert_eq!(tire.rim, 17.0);
    // no public_price column: falls back to the lista cell
    assert_eq!(tire.public_price, 2500.0);

    let inventory = db
        .inventory()
        .get_by_tire_id(&tire.id)
        .await
        .unwrap()
        .expect("inventory created by import");
    assert_eq!(inventory.quantity, 12);

    assert_eq!(price_of(&db, &tire.id, "lista").await, Some(2500.0));
    assert_eq!(price_of(&db, &tire.id, "mayoreo").await, Some(2200.0));
    // derived columns recompute once at the end of the import
    assert_eq!(price_of(&db, &tire.id, "mayoreo_6").await, Some(2068.0));
}

#[tokio::test]
async fn xlsx_import_requires_a_sku_column_and_skips_blank_skus() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    let no_sku = build_sheet(&["model", "width"], &[vec!["TURANZA", "205"]]);
    let err = catalog.import_from_xlsx(&no_sku).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

    let with_blank = build_sheet(
        &["sku", "model", "width", "rim"],
        &[
            vec!["IMP-010", "TURANZA", "205", "16"],
            vec!["", "GHOST ROW", "195", "15"],
        ],
    );
    let processed = catalog.import_from_xlsx(&with_blank).await.unwrap();
    assert_eq!(processed, 1);
    assert!(catalog.get("IMP-010").await.is_ok());
}

#[tokio::test]
async fn xlsx_import_updates_only_the_columns_present() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    let before = create_tire(&catalog, "IMP-020").await;
    assert_eq!(before.model, "TURANZA T005");
    assert_eq!(before.width, 205);

    // the sheet carries only sku and width: every other field must survive
    let payload = build_sheet(&["sku", "width"], &[vec!["IMP-020", "215"]]);
    catalog.import_from_xlsx(&payload).await.unwrap();

    let after = catalog.get("IMP-020").await.unwrap();
    assert_eq!(after.width, 215);
    assert_eq!(after.model, "TURANZA T005");
    assert_eq!(after.profile, Some(55));
    assert_eq!(after.rim, 16.0);
    assert_eq!(after.brand_id, before.brand_id);
}

#[tokio::test]
async fn csv_import_follows_the_legacy_layout() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();

    let csv = "\
CODIGO;MEDIDA;CANT;MAY6;MAY3;MAYOREO;EMPRESA;LISTA;LISTA10;EFEC;X;X;X;MARCA;TIPO;RIN;USO
CSV-001;205/55R16 91V TURANZA;6;;;2100;;2350;;;;;;BS;PS;16;PS
";

    let processed = catalog.import_from_csv(csv.as_bytes()).await.unwrap();
    assert_eq!(processed, 1);

    let tire = catalog.get("CSV-001").await.unwrap();
    assert_eq!(tire.width, 205);
    assert_eq!(tire.profile, Some(55));
    assert_eq!(tire.rim, 16.0);
    assert_eq!(tire.construction, "R");
    assert_eq!(tire.usage_abbr, "PS");
    assert_eq!(tire.public_price, 2350.0);
    assert_eq!(tire.original_size, "205/55R16 91V TURANZA");

    // the alias dictionary resolves BS to Bridgestone
    let brand = db
        .brands()
        .get_by_id(tire.brand_id)
        .await
        .unwrap()
        .expect("brand created");
    assert_eq!(brand.name, "Bridgestone");

    let inventory = db
        .inventory()
        .get_by_tire_id(&tire.id)
        .await
        .unwrap()
        .expect("inventory row");
    assert_eq!(inventory.quantity, 6);
    assert_eq!(inventory.min_stock, 4);

    assert_eq!(price_of(&db, &tire.id, "mayoreo").await, Some(2100.0));
    assert_eq!(price_of(&db, &tire.id, "lista").await, Some(2350.0));
}

#[tokio::test]
async fn csv_import_rejects_incomplete_rows() {
    let db = test_db().await;
    let catalog = CatalogService::new(db);

    let csv = "\
CODIGO;MEDIDA;CANT
CSV-002;205/55R16;4
";
    let err = catalog.import_from_csv(csv.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn export_round_trips_through_the_importer_layout() {
    let db = test_db().await;
    let catalog = CatalogService::new(db.clone());

    create_tire(&catalog, "EXP-001").await;
    catalog
        .create_column(fixed_column("mayoreo", 3))
        .await
        .unwrap();

    let mut prices = HashMap::new();
    prices.insert("lista".to_string(), Some(2350.0));
    prices.insert("mayoreo".to_string(), Some(2100.0));
    catalog
        .update_admin("EXP-001", Some(9), &prices)
        .await
        .unwrap();

    let payload = catalog
        .export_admin(&treadstock_core::TireFilter::default())
        .await
        .unwrap();
    assert!(!payload.is_empty());

    // read the workbook back and check the layout
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(payload)).unwrap();
    let range = workbook.worksheet_range("Catalog").unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    let header = &rows[0];
    assert_eq!(header[0], "sku");
    assert!(header.iter().any(|h| h == "lista"));
    assert!(header.iter().any(|h| h == "mayoreo"));
    assert!(header.iter().any(|h| h == "quantity"));

    let lista_idx = header.iter().position(|h| h == "lista").unwrap();
    let quantity_idx = header.iter().position(|h| h == "quantity").unwrap();
    let data = rows
        .iter()
        .find(|row| row.first().map(String::as_str) == Some("EXP-001"))
        .expect("exported row");
    assert_eq!(data[lista_idx], "2350");
    assert_eq!(data[quantity_idx], "9");

    // and the export feeds straight back into the importer
    let reimported = catalog
        .export_admin(&treadstock_core::TireFilter::default())
        .await
        .unwrap();
    let processed = catalog.import_from_xlsx(&reimported).await.unwrap();
    assert_eq!(processed, 1);
}
