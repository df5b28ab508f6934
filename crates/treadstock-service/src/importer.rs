//! # Bulk Import
//!
//! Two import paths feed the catalog:
//!
//! - **XLSX** (`import_from_xlsx`): the admin round-trip format. Header
//!   driven; only `sku` is mandatory, every other column is optional and
//!   applied only when present, and any header matching a price column code
//!   populates that column's price.
//! - **CSV** (`import_from_csv`): the legacy semicolon-delimited supplier
//!   inventory layout with fixed column positions.
//!
//! ## XLSX Update Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each field of each row:                                           │
//! │    header present in sheet?  → take the sheet's value                  │
//! │    header absent, tire known → keep the stored value                   │
//! │    header absent, tire new   → zero value                              │
//! │                                                                         │
//! │  Rows without a SKU are skipped silently. Derived columns recompute    │
//! │  ONCE at the end of the import, not per row.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use treadstock_core::{Inventory, Tire, TirePrice, TireUpsert, LIST_PRICE_CODE};

use crate::catalog::CatalogService;
use crate::error::{ServiceError, ServiceResult};
use crate::parser::{
    build_size_label, clean_model, default_construction, extract_first_number, parse_float,
    parse_int, parse_price,
};

/// Sheet the admin export writes and the importer looks for first.
pub(crate) const CATALOG_SHEET: &str = "Catalog";

/// Minimum stock assigned to rows created by the legacy CSV import.
const CSV_DEFAULT_MIN_STOCK: i64 = 4;

/// Legacy CSV layout: position → price column code.
/// 0 sku; 1 measurement; 2 quantity; then the price tiers.
const CSV_PRICE_LAYOUT: &[(usize, &str)] = &[
    (3, "mayoreo_6"),
    (4, "mayoreo_3"),
    (5, "mayoreo"),
    (6, "empresa"),
    (7, "lista"),
    (8, "lista_10"),
    (9, "efectivo"),
];

impl CatalogService {
    // =========================================================================
    // XLSX Import
    // =========================================================================

    /// Imports the admin catalog layout from an XLSX payload.
    ///
    /// Returns the number of processed rows.
    pub async fn import_from_xlsx(&self, data: &[u8]) -> ServiceResult<usize> {
        if data.is_empty() {
            return Err(ServiceError::validation("the XLSX payload is empty"));
        }

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
            .map_err(|e| ServiceError::validation(format!("failed to open XLSX: {e}")))?;

        let sheet_names = workbook.sheet_names().to_owned();
        if sheet_names.is_empty() {
            return Err(ServiceError::validation("the XLSX file contains no sheets"));
        }
        let sheet = if sheet_names.iter().any(|name| name == CATALOG_SHEET) {
            CATALOG_SHEET.to_string()
        } else {
            sheet_names[0].clone()
        };

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ServiceError::validation(format!("failed to read XLSX rows: {e}")))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| ServiceError::validation("the XLSX file contains no data"))?;

        let col_index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| {
                let key = cell.to_string().trim().to_lowercase();
                if key.is_empty() {
                    None
                } else {
                    Some((key, idx))
                }
            })
            .collect();

        if !col_index.contains_key("sku") {
            return Err(ServiceError::validation(
                "the XLSX file must contain a 'sku' column",
            ));
        }

        // Price columns that have a matching header in this sheet
        let columns = self.db.price_columns().list().await?;
        let price_code_to_idx: Vec<(String, usize)> = columns
            .iter()
            .filter(|c| !c.code.trim().is_empty())
            .filter_map(|c| col_index.get(&c.code).map(|idx| (c.code.clone(), *idx)))
            .collect();

        let mut processed = 0;

        for row in rows {
            let sku = cell_value(&col_index, row, "sku");
            if sku.is_empty() {
                // Rows without a SKU are skipped silently
                continue;
            }

            let existing = self.db.tires().get_by_sku(&sku).await?;
            let is_new = existing.is_none();

            let mut cmd = TireUpsert {
                sku: sku.clone(),
                ..TireUpsert::default()
            };

            // Field by field: sheet value when the header exists, stored
            // value otherwise (for known tires)
            if has_column(&col_index, "brand") {
                cmd.brand_name = cell_value(&col_index, row, "brand");
            } else if let Some(tire) = &existing {
                // Keep the current brand by resolving its stored name
                if let Some(brand) = self.db.brands().get_by_id(tire.brand_id).await? {
                    cmd.brand_name = brand.name;
                }
            }

            if has_column(&col_index, "model") {
                cmd.model = cell_value(&col_index, row, "model");
            } else if let Some(tire) = &existing {
                cmd.model = tire.model.clone();
            }

            if has_column(&col_index, "width") {
                let raw = cell_value(&col_index, row, "width");
                if !raw.is_empty() {
                    cmd.width = parse_int(&raw);
                }
            } else if let Some(tire) = &existing {
                cmd.width = tire.width;
            }

            if has_column(&col_index, "profile") {
                let raw = cell_value(&col_index, row, "profile");
                if !raw.is_empty() {
                    let value = parse_int(&raw);
                    if value > 0 {
                        cmd.profile = Some(value);
                    }
                }
            } else if let Some(tire) = &existing {
                cmd.profile = tire.profile;
            }

            if has_column(&col_index, "rim") {
                let raw = cell_value(&col_index, row, "rim");
                if !raw.is_empty() {
                    cmd.rim = parse_float(&raw);
                }
            } else if let Some(tire) = &existing {
                cmd.rim = tire.rim;
            }

            if has_column(&col_index, "construction") {
                cmd.construction = cell_value(&col_index, row, "construction");
            } else if let Some(tire) = &existing {
                cmd.construction = tire.construction.clone();
            }

            if has_column(&col_index, "tube_type") {
                cmd.tube_type = cell_value(&col_index, row, "tube_type");
            } else if let Some(tire) = &existing {
                cmd.tube_type = tire.tube_type.clone();
            }

            if has_column(&col_index, "ply_rating") {
                cmd.ply_rating = cell_value(&col_index, row, "ply_rating");
            } else if let Some(tire) = &existing {
                cmd.ply_rating = tire.ply_rating.clone();
            }

            if has_column(&col_index, "load_index") {
                cmd.load_index = cell_value(&col_index, row, "load_index");
            } else if let Some(tire) = &existing {
                cmd.load_index = tire.load_index.clone();
            }

            if has_column(&col_index, "speed_index") {
                cmd.speed_index = cell_value(&col_index, row, "speed_index");
            } else if let Some(tire) = &existing {
                cmd.speed_index = tire.speed_index.clone();
            }

            if has_column(&col_index, "usage") {
                cmd.usage_abbr = cell_value(&col_index, row, "usage");
            } else if let Some(tire) = &existing {
                cmd.usage_abbr = tire.usage_abbr.clone();
            }

            if has_column(&col_index, "description") {
                cmd.description = cell_value(&col_index, row, "description");
            } else if let Some(tire) = &existing {
                cmd.description = tire.description.clone();
            }

            if has_column(&col_index, "image_url") {
                cmd.image_url = cell_value(&col_index, row, "image_url");
            } else if let Some(tire) = &existing {
                cmd.image_url = tire.image_url.clone();
            }

            if has_column(&col_index, "public_price") {
                let raw = cell_value(&col_index, row, "public_price");
                if !raw.is_empty() {
                    cmd.public_price = parse_price(&raw);
                }
            } else if let Some(tire) = &existing {
                cmd.public_price = tire.public_price;
            }

            // Dynamic price columns present in the sheet
            let mut prices: HashMap<String, Option<f64>> = HashMap::new();
            for (code, idx) in &price_code_to_idx {
                let Some(cell) = row.get(*idx) else { continue };
                let raw = cell.to_string().trim().to_string();
                if raw.is_empty() {
                    continue;
                }
                let value = parse_price(&raw);
                if value <= 0.0 {
                    continue;
                }
                prices.insert(code.clone(), Some(value));
            }

            // An empty public price falls back to the list column
            if cmd.public_price <= 0.0 {
                if let Some(Some(list_price)) = prices.get(LIST_PRICE_CODE) {
                    if *list_price > 0.0 {
                        cmd.public_price = *list_price;
                    }
                }
            }

            // Rebuild the display size when we have dimensions to work with
            if cmd.width > 0 || cmd.rim > 0.0 {
                cmd.original_size = build_size_label(
                    cmd.width,
                    cmd.profile,
                    cmd.rim,
                    &cmd.construction,
                    &cmd.ply_rating,
                    &cmd.usage_abbr,
                    &cmd.load_index,
                    &cmd.speed_index,
                    &cmd.model,
                );
            } else if let Some(tire) = &existing {
                cmd.original_size = tire.original_size.clone();
            }

            self.upsert_from_measurement(cmd).await?;

            // Inventory and prices reuse the admin update path, with the
            // derived recompute deferred to the final pass below
            let quantity = if has_column(&col_index, "quantity") {
                let raw = cell_value(&col_index, row, "quantity");
                if raw.is_empty() {
                    None
                } else {
                    Some(parse_int(&raw))
                }
            } else {
                None
            };

            if quantity.is_some() || !prices.is_empty() {
                self.update_admin_internal(&sku, quantity, &prices, false)
                    .await?;
            }

            processed += 1;
        }

        // One recompute pass over every derived column
        for column in &columns {
            if column.is_derived() {
                self.recalculate_derived_column(column).await?;
            }
        }

        info!(rows = processed, "XLSX import complete");
        Ok(processed)
    }

    // =========================================================================
    // Legacy CSV Import
    // =========================================================================

    /// Imports the semicolon-delimited supplier inventory layout.
    ///
    /// Returns the number of processed rows.
    pub async fn import_from_csv(&self, data: &[u8]) -> ServiceResult<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .trim(csv::Trim::All)
            .has_headers(true)
            .from_reader(data);

        let columns = self.db.price_columns().list().await?;
        let code_to_id: HashMap<String, i64> = columns
            .iter()
            .filter(|c| !c.code.trim().is_empty())
            .map(|c| (c.code.clone(), c.id))
            .collect();

        let mut processed = 0;

        for (index, record) in reader.records().enumerate() {
            // +2: 1-based lines, header on line 1
            let line = index + 2;
            let record = record
                .map_err(|e| ServiceError::validation(format!("row {line}: {e}")))?;
            if record.is_empty() {
                continue;
            }

            let cmd = self
                .build_csv_command(&record)
                .map_err(|err| match err {
                    ServiceError::Validation(msg) => {
                        ServiceError::validation(format!("row {line}: {msg}"))
                    }
                    other => other,
                })?;

            let tire = self.upsert_from_measurement(cmd).await?;
            self.apply_csv_inventory_and_prices(&tire, &record, &code_to_id)
                .await?;
            processed += 1;
        }

        info!(rows = processed, "CSV import complete");
        Ok(processed)
    }

    /// Builds an upsert command from one legacy CSV row.
    fn build_csv_command(&self, row: &csv::StringRecord) -> ServiceResult<TireUpsert> {
        if row.len() < 17 {
            return Err(ServiceError::validation(format!(
                "incomplete row: expected at least 17 columns, got {}",
                row.len()
            )));
        }

        let sku = row.get(0).unwrap_or("").trim().to_string();
        if sku.is_empty() {
            return Err(ServiceError::validation("empty sku"));
        }

        let measurement = row.get(1).unwrap_or("").trim().to_string();
        if measurement.is_empty() {
            return Err(ServiceError::validation(format!(
                "empty measurement for sku {sku}"
            )));
        }

        let data = self.parser.parse(&measurement);
        let mut model = clean_model(&data.remainder);
        if model.is_empty() {
            model = measurement.clone();
        }

        let alias = row.get(13).unwrap_or("").trim().to_string();
        let brand = self.dictionaries.normalize_brand(&alias, &model);
        let normalized_type = self
            .dictionaries
            .normalize_type(row.get(14).unwrap_or(""), &model);

        let mut usage = row.get(16).unwrap_or("").trim().to_uppercase();
        if usage.is_empty() {
            usage = row.get(15).unwrap_or("").trim().to_uppercase();
        }

        let mut width = data.width;
        if width == 0 {
            width = parse_int(&extract_first_number(&measurement));
        }
        if width == 0 {
            return Err(ServiceError::validation(format!(
                "could not determine the width for sku {sku}"
            )));
        }

        let mut rim = data.rim;
        if rim == 0.0 {
            rim = parse_float(row.get(15).unwrap_or(""));
        }
        if rim == 0.0 {
            return Err(ServiceError::validation(format!(
                "could not determine the rim for sku {sku}"
            )));
        }

        let mut price = parse_price(row.get(7).unwrap_or(""));
        if price == 0.0 {
            price = parse_price(row.get(8).unwrap_or(""));
        }
        if price == 0.0 {
            price = parse_price(row.get(9).unwrap_or(""));
        }

        let description = clean_model(&format!("{measurement} {model}"));

        Ok(TireUpsert {
            sku,
            brand_name: brand,
            brand_alias: alias.to_uppercase(),
            model,
            width,
            profile: data.profile,
            rim,
            construction: default_construction(&data.construction, &measurement),
            tube_type: data.tube_type,
            ply_rating: data.ply_rating,
            load_index: data.load_index,
            speed_index: data.speed_index,
            normalized_type,
            usage_abbr: usage,
            description,
            public_price: price,
            image_url: String::new(),
            original_size: measurement,
        })
    }

    /// Writes the quantity and tiered prices carried by one CSV row.
    async fn apply_csv_inventory_and_prices(
        &self,
        tire: &Tire,
        row: &csv::StringRecord,
        code_to_id: &HashMap<String, i64>,
    ) -> ServiceResult<()> {
        let now = Utc::now();

        // Column 2 carries the on-hand count
        if row.len() > 2 {
            let quantity = parse_int(row.get(2).unwrap_or(""));
            let inventory = Inventory {
                id: Uuid::new_v4().to_string(),
                tire_id: tire.id.clone(),
                quantity,
                reserved: 0,
                min_stock: CSV_DEFAULT_MIN_STOCK,
                created_at: now,
                updated_at: now,
            };
            self.db.inventory().upsert(&inventory).await?;
        }

        let mut prices = Vec::new();
        for (idx, code) in CSV_PRICE_LAYOUT {
            let Some(raw) = row.get(*idx) else { continue };
            let Some(column_id) = code_to_id.get(*code).copied() else {
                continue;
            };
            let value = parse_price(raw);
            if value <= 0.0 {
                continue;
            }
            prices.push(TirePrice {
                tire_id: tire.id.clone(),
                column_id,
                price: value,
                created_at: now,
                updated_at: now,
            });
        }

        if !prices.is_empty() {
            self.db.prices().upsert_many(&prices).await?;
        }

        Ok(())
    }
}

fn has_column(col_index: &HashMap<String, usize>, key: &str) -> bool {
    col_index.contains_key(key)
}

fn cell_value(col_index: &HashMap<String, usize>, row: &[Data], key: &str) -> String {
    col_index
        .get(key)
        .and_then(|idx| row.get(*idx))
        .map(|cell| cell.to_string().trim().to_string())
        .unwrap_or_default()
}
