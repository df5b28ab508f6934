//! # Admin Catalog Export
//!
//! Produces the XLSX admin catalog: technical data, inventory, public price
//! and one column per price-column code, in registry visual order. The
//! layout round-trips through `import_from_xlsx`.

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use treadstock_core::{AdminTire, TireFilter};

use crate::catalog::CatalogService;
use crate::error::ServiceResult;
use crate::importer::CATALOG_SHEET;

/// Page size for walking the admin projection during export.
const EXPORT_PAGE_SIZE: i64 = 500;

/// Fixed headers preceding the dynamic price columns.
const LEADING_HEADERS: &[&str] = &[
    "sku",
    "brand",
    "model",
    "width",
    "profile",
    "construction",
    "rim",
    "tube_type",
    "ply_rating",
    "load_index",
    "speed_index",
    "usage",
    "quantity",
    "min_stock",
    "public_price",
];

/// Headers appended after the dynamic price columns.
const TRAILING_HEADERS: &[&str] = &["description", "image_url"];

impl CatalogService {
    /// Exports the filtered admin catalog as an XLSX payload.
    pub async fn export_admin(&self, filter: &TireFilter) -> ServiceResult<Vec<u8>> {
        // Price column codes define the dynamic part of the header row,
        // ordered by visual position then code
        let columns = self.db.price_columns().list().await?;
        let mut ordered: Vec<(String, i64)> = columns
            .iter()
            .filter(|c| !c.code.trim().is_empty())
            .map(|c| (c.code.clone(), c.visual_order))
            .collect();
        ordered.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let price_codes: Vec<String> = ordered.into_iter().map(|(code, _)| code).collect();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(CATALOG_SHEET)?;

        // Header row
        let mut col: u16 = 0;
        for header in LEADING_HEADERS
            .iter()
            .copied()
            .chain(price_codes.iter().map(String::as_str))
            .chain(TRAILING_HEADERS.iter().copied())
        {
            worksheet.write_string(0, col, header)?;
            col += 1;
        }

        // Data rows, paginated over the admin projection
        let mut row: u32 = 1;
        let mut offset = 0;

        loop {
            let mut page_filter = filter.clone();
            page_filter.limit = EXPORT_PAGE_SIZE;
            page_filter.offset = offset;

            let (items, total) = self.admin_list(&page_filter).await?;
            if items.is_empty() {
                break;
            }
            let page_len = items.len() as i64;

            for item in &items {
                write_admin_row(worksheet, row, item, &price_codes)?;
                row += 1;
            }

            offset += page_len;
            if offset >= total {
                break;
            }
        }

        let buffer = workbook.save_to_buffer()?;

        info!(rows = row - 1, "Admin catalog exported");
        Ok(buffer)
    }
}

/// Writes one admin projection row in the export layout.
fn write_admin_row(
    worksheet: &mut Worksheet,
    row: u32,
    item: &AdminTire,
    price_codes: &[String],
) -> ServiceResult<()> {
    let tire = &item.tire;
    let (quantity, min_stock) = item
        .inventory
        .as_ref()
        .map(|inv| (inv.quantity, inv.min_stock))
        .unwrap_or((0, 0));

    let mut col: u16 = 0;

    worksheet.write_string(row, col, &tire.sku)?;
    col += 1;
    worksheet.write_string(row, col, item.brand_name.as_deref().unwrap_or(""))?;
    col += 1;
    worksheet.write_string(row, col, &tire.model)?;
    col += 1;
    worksheet.write_number(row, col, tire.width as f64)?;
    col += 1;
    match tire.profile {
        Some(profile) => worksheet.write_number(row, col, profile as f64)?,
        None => worksheet.write_string(row, col, "")?,
    };
    col += 1;
    worksheet.write_string(row, col, &tire.construction)?;
    col += 1;
    worksheet.write_number(row, col, tire.rim)?;
    col += 1;

    for value in [
        &tire.tube_type,
        &tire.ply_rating,
        &tire.load_index,
        &tire.speed_index,
        &tire.usage_abbr,
    ] {
        worksheet.write_string(row, col, value)?;
        col += 1;
    }

    for value in [quantity as f64, min_stock as f64, tire.public_price] {
        worksheet.write_number(row, col, value)?;
        col += 1;
    }

    for code in price_codes {
        match item.prices.get(code) {
            Some(price) => worksheet.write_number(row, col, *price)?,
            None => worksheet.write_string(row, col, "")?,
        };
        col += 1;
    }

    worksheet.write_string(row, col, &tire.description)?;
    col += 1;
    worksheet.write_string(row, col, &tire.image_url)?;

    Ok(())
}
