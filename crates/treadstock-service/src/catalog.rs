//! # Catalog Service
//!
//! Tire catalog use cases: SKU-keyed upserts, listings, the admin and
//! public projections, and the combined inventory/price admin update that
//! triggers targeted derivation recomputes.
//!
//! ## Admin Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_admin(sku, quantity?, prices{code → value?})                   │
//! │       │                                                                 │
//! │       ├── quantity present?  → lazy inventory upsert                   │
//! │       │                                                                 │
//! │       ├── prices present?    → bulk upsert of known codes              │
//! │       │       │                                                         │
//! │       │       ├── "lista" edited? → sync tire.public_price             │
//! │       │       │                                                         │
//! │       │       └── recompute ONLY the active derived columns whose      │
//! │       │           base_code intersects the edited codes (one level;    │
//! │       │           chains recompute when their own upstream changes)    │
//! │       │                                                                 │
//! │       └── returns the refreshed admin view                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column registry operations and the derivation engine itself live in
//! `columns.rs`; spreadsheet import/export in `importer.rs` / `export.rs`.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use treadstock_core::{
    AdminTire, Brand, CatalogItem, Inventory, PriceColumn, Tire, TireFilter, TirePrice,
    TireUpsert, LIST_PRICE_CODE,
};
use treadstock_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::parser::{ImportDictionaries, MeasurementParser};

/// Application service for the tire catalog.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pub(crate) db: Database,
    pub(crate) dictionaries: ImportDictionaries,
    pub(crate) parser: MeasurementParser,
}

impl CatalogService {
    /// Creates a catalog service with the production dictionaries.
    pub fn new(db: Database) -> Self {
        CatalogService::with_dictionaries(db, ImportDictionaries::default())
    }

    /// Creates a catalog service with caller-supplied normalization tables.
    pub fn with_dictionaries(db: Database, dictionaries: ImportDictionaries) -> Self {
        CatalogService {
            db,
            dictionaries,
            parser: MeasurementParser::default(),
        }
    }

    // =========================================================================
    // Tire CRUD
    // =========================================================================

    /// SKU-keyed insert-or-update of a tire from a measurement command.
    ///
    /// Brands resolve by alias, then by name, and are created (with their
    /// aliases) when unknown; normalized types resolve by name and are
    /// created when unknown.
    pub async fn upsert_from_measurement(&self, cmd: TireUpsert) -> ServiceResult<Tire> {
        let sku = cmd.sku.trim().to_string();
        if sku.is_empty() {
            return Err(ServiceError::validation("sku is required"));
        }

        let brand = self.resolve_brand(&cmd.brand_name, &cmd.brand_alias).await?;
        let type_id = self.resolve_type(&cmd.normalized_type).await?;

        let now = Utc::now();
        let existing = self.db.tires().get_by_sku(&sku).await?;
        let is_new = existing.is_none();

        let mut tire = existing.unwrap_or_else(|| Tire {
            id: Uuid::new_v4().to_string(),
            sku: sku.clone(),
            brand_id: brand.id,
            model: String::new(),
            width: 0,
            profile: None,
            rim: 0.0,
            construction: String::new(),
            tube_type: String::new(),
            ply_rating: String::new(),
            load_index: String::new(),
            speed_index: String::new(),
            normalized_type_id: None,
            usage_abbr: String::new(),
            description: String::new(),
            public_price: 0.0,
            image_url: String::new(),
            original_size: String::new(),
            created_at: now,
            updated_at: now,
        });

        tire.brand_id = brand.id;
        tire.model = cmd.model.trim().to_string();
        tire.width = cmd.width;
        tire.profile = cmd.profile;
        tire.rim = cmd.rim;
        tire.construction = cmd.construction.trim().to_uppercase();
        tire.tube_type = cmd.tube_type.trim().to_uppercase();
        tire.ply_rating = cmd.ply_rating.trim().to_string();
        tire.load_index = cmd.load_index.trim().to_string();
        tire.speed_index = cmd.speed_index.trim().to_string();
        tire.normalized_type_id = type_id.filter(|id| *id != 0);
        tire.usage_abbr = cmd.usage_abbr.trim().to_uppercase();
        tire.description = cmd.description.trim().to_string();
        tire.public_price = cmd.public_price;
        tire.image_url = cmd.image_url.trim().to_string();
        tire.original_size = cmd.original_size.trim().to_string();
        tire.updated_at = now;

        if is_new {
            self.db.tires().insert(&tire).await?;
        } else {
            self.db.tires().update(&tire).await?;
        }

        Ok(tire)
    }

    /// Gets a tire by SKU.
    pub async fn get(&self, sku: &str) -> ServiceResult<Tire> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ServiceError::validation("sku is required"));
        }
        self.db
            .tires()
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tire", sku))
    }

    /// Deletes a tire by SKU. The inventory row is left in place.
    pub async fn delete(&self, sku: &str) -> ServiceResult<()> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ServiceError::validation("sku is required"));
        }
        self.db.tires().delete(sku).await?;
        Ok(())
    }

    /// Lists tires matching the filter.
    pub async fn list(&self, filter: &TireFilter) -> ServiceResult<(Vec<Tire>, i64)> {
        Ok(self.db.tires().list(filter).await?)
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Admin grid view: each tire joined with its inventory row and a
    /// `code → price` map resolved through the registry.
    pub async fn admin_list(&self, filter: &TireFilter) -> ServiceResult<(Vec<AdminTire>, i64)> {
        let (items, total) = self.list(filter).await?;
        if items.is_empty() {
            return Ok((Vec::new(), total));
        }

        let code_by_id = self.column_code_by_id().await?;
        let brand_names = self.brand_names().await?;

        let mut result = Vec::with_capacity(items.len());
        for tire in items {
            result.push(self.admin_view(tire, &code_by_id, &brand_names).await?);
        }

        Ok((result, total))
    }

    /// Public/levelled catalog listing.
    ///
    /// The level resolves to a main column (and optional reference column)
    /// through the dynamic price level table first, falling back to the
    /// static tier map; the main price falls back to the tire's stored
    /// public price, then 0.
    pub async fn list_catalog(
        &self,
        filter: &TireFilter,
        level: &str,
    ) -> ServiceResult<(Vec<CatalogItem>, i64)> {
        let (items, total) = self.list(filter).await?;
        if items.is_empty() {
            return Ok((Vec::new(), total));
        }

        let (main_code, ref_code) = self.resolve_level_columns(level).await?;

        let columns = self.db.price_columns().list().await?;
        let code_to_id: HashMap<String, i64> = columns
            .iter()
            .map(|c| (c.code.clone(), c.id))
            .collect();

        let main_id = code_to_id.get(&main_code).copied();
        let ref_id = ref_code
            .as_ref()
            .and_then(|code| code_to_id.get(code))
            .copied();

        let mut result = Vec::with_capacity(items.len());
        for tire in items {
            let mut main_price = None;
            let mut ref_price = None;

            if main_id.is_some() || ref_id.is_some() {
                for price in self.db.prices().list_by_tire_id(&tire.id).await? {
                    if Some(price.column_id) == main_id {
                        main_price = Some(price.price);
                    }
                    if Some(price.column_id) == ref_id {
                        ref_price = Some(price.price);
                    }
                }
            }

            let price = main_price.unwrap_or(if tire.public_price > 0.0 {
                tire.public_price
            } else {
                0.0
            });

            let stock = self
                .db
                .inventory()
                .get_by_tire_id(&tire.id)
                .await?
                .map(|inv| inv.quantity);

            let mut item = CatalogItem {
                tire,
                price,
                price_code: main_code.clone(),
                reference_price: None,
                reference_code: None,
                stock,
            };
            if let Some(reference) = ref_price {
                item.reference_price = Some(reference);
                item.reference_code = ref_code.clone();
            }
            result.push(item);
        }

        Ok((result, total))
    }

    // =========================================================================
    // Admin Update
    // =========================================================================

    /// Updates inventory and per-column prices for one tire, syncing the
    /// public price with `lista` and recomputing affected derived columns.
    pub async fn update_admin(
        &self,
        sku: &str,
        quantity: Option<i64>,
        prices: &HashMap<String, Option<f64>>,
    ) -> ServiceResult<AdminTire> {
        self.update_admin_internal(sku, quantity, prices, true).await
    }

    /// Shared inventory/price update logic.
    ///
    /// `recalc_derived` lets bulk operations (imports) defer the derived
    /// recompute to one pass at the end instead of per row.
    pub(crate) async fn update_admin_internal(
        &self,
        sku: &str,
        quantity: Option<i64>,
        prices: &HashMap<String, Option<f64>>,
        recalc_derived: bool,
    ) -> ServiceResult<AdminTire> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ServiceError::validation("sku is required"));
        }

        let mut tire = self
            .db
            .tires()
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tire", sku))?;

        let now = Utc::now();

        // Inventory: created lazily on first admin update
        if let Some(quantity) = quantity {
            let inventory = self.db.inventory().get_by_tire_id(&tire.id).await?;
            let mut inventory = inventory.unwrap_or_else(|| Inventory {
                id: Uuid::new_v4().to_string(),
                tire_id: tire.id.clone(),
                quantity: 0,
                reserved: 0,
                min_stock: 0,
                created_at: now,
                updated_at: now,
            });
            inventory.quantity = quantity;
            self.db.inventory().upsert(&inventory).await?;
        }

        // Prices
        if !prices.is_empty() {
            let columns = self.db.price_columns().list().await?;
            let code_to_id: HashMap<String, i64> = columns
                .iter()
                .map(|c| (c.code.clone(), c.id))
                .collect();

            let mut to_upsert = Vec::new();
            let mut changed_codes: HashSet<String> = HashSet::new();
            let mut updated_list_price = None;

            for (code, value) in prices {
                let clean = code.trim().to_lowercase();
                if clean.is_empty() {
                    continue;
                }
                let Some(column_id) = code_to_id.get(&clean).copied() else {
                    continue;
                };
                let Some(value) = *value else {
                    continue;
                };

                to_upsert.push(TirePrice {
                    tire_id: tire.id.clone(),
                    column_id,
                    price: value,
                    created_at: now,
                    updated_at: now,
                });
                if clean == LIST_PRICE_CODE {
                    updated_list_price = Some(value);
                }
                changed_codes.insert(clean);
            }

            if !to_upsert.is_empty() {
                self.db.prices().upsert_many(&to_upsert).await?;
            }

            // The public catalog price mirrors the list column
            if let Some(list_price) = updated_list_price {
                tire.public_price = list_price;
                tire.updated_at = now;
                self.db.tires().update(&tire).await?;
            }

            // Targeted recompute: only active derived columns whose base
            // was edited. A derived-of-derived chain recomputes when its
            // own upstream column changes, one level per trigger.
            if recalc_derived && !changed_codes.is_empty() {
                for column in &columns {
                    if !column.is_derived() || !column.active {
                        continue;
                    }
                    let Some(base_code) = normalized_base_code(column) else {
                        continue;
                    };
                    if changed_codes.contains(&base_code) {
                        self.recalculate_derived_column(column).await?;
                    }
                }
            }

            info!(sku = %sku, prices = to_upsert.len(), "Admin price update applied");
        }

        // Return the refreshed admin view
        let code_by_id = self.column_code_by_id().await?;
        let brand_names = self.brand_names().await?;
        let tire = self
            .db
            .tires()
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tire", sku))?;
        self.admin_view(tire, &code_by_id, &brand_names).await
    }

    // =========================================================================
    // Shared Helpers
    // =========================================================================

    pub(crate) async fn admin_view(
        &self,
        tire: Tire,
        code_by_id: &HashMap<i64, String>,
        brand_names: &HashMap<i64, String>,
    ) -> ServiceResult<AdminTire> {
        let inventory = self.db.inventory().get_by_tire_id(&tire.id).await?;

        let mut prices = HashMap::new();
        for price in self.db.prices().list_by_tire_id(&tire.id).await? {
            if let Some(code) = code_by_id.get(&price.column_id) {
                prices.insert(code.clone(), price.price);
            }
        }

        let brand_name = brand_names.get(&tire.brand_id).cloned();

        Ok(AdminTire {
            tire,
            inventory,
            prices,
            brand_name,
        })
    }

    pub(crate) async fn column_code_by_id(&self) -> ServiceResult<HashMap<i64, String>> {
        let columns = self.db.price_columns().list().await?;
        Ok(columns
            .into_iter()
            .filter(|c| !c.code.trim().is_empty())
            .map(|c| (c.id, c.code))
            .collect())
    }

    pub(crate) async fn brand_names(&self) -> ServiceResult<HashMap<i64, String>> {
        let brands = self.db.brands().list().await?;
        Ok(brands.into_iter().map(|b| (b.id, b.name)).collect())
    }

    async fn resolve_level_columns(&self, level: &str) -> ServiceResult<(String, Option<String>)> {
        let level_key = level.trim().to_lowercase();

        if !level_key.is_empty() {
            if let Some(found) = self.db.price_levels().get_by_code(&level_key).await? {
                let mut main_code = LIST_PRICE_CODE.to_string();
                let configured = found.price_column.trim();
                if !configured.is_empty() {
                    main_code = configured.to_lowercase();
                }
                let ref_code = found
                    .reference_column
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_lowercase);
                return Ok((main_code, ref_code));
            }
        }

        Ok(static_level_columns(&level_key))
    }

    async fn resolve_brand(&self, name: &str, alias: &str) -> ServiceResult<Brand> {
        let alias_clean = alias.trim().to_uppercase();

        if !alias_clean.is_empty() {
            if let Some(brand) = self.db.brands().get_by_alias(&alias_clean).await? {
                return Ok(brand);
            }
        }

        let mut cleaned_name = name.trim().to_string();
        if cleaned_name.is_empty() {
            cleaned_name = if alias_clean.is_empty() {
                "Otras Marcas".to_string()
            } else {
                alias_clean.clone()
            };
        }

        if let Some(brand) = self.db.brands().get_by_name(&cleaned_name).await? {
            return Ok(brand);
        }

        let mut aliases = Vec::new();
        if !alias_clean.is_empty() {
            aliases.push(alias_clean);
        }
        aliases.push(cleaned_name.clone());

        Ok(self.db.brands().create(&cleaned_name, &aliases).await?)
    }

    async fn resolve_type(&self, name: &str) -> ServiceResult<Option<i64>> {
        let cleaned = name.trim();
        if cleaned.is_empty() {
            return Ok(None);
        }

        if let Some(existing) = self.db.normalized_types().get_by_name(cleaned).await? {
            return Ok(Some(existing.id));
        }

        let created = self.db.normalized_types().create(cleaned, "").await?;
        Ok(Some(created.id))
    }
}

/// Lowercased, trimmed base code of a derived column, when present.
pub(crate) fn normalized_base_code(column: &PriceColumn) -> Option<String> {
    column
        .base_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
}

/// Static tier → (main column, reference column) fallback, used when the
/// level is absent from the price level table.
fn static_level_columns(level_key: &str) -> (String, Option<String>) {
    match level_key {
        "empresa" => ("empresa".to_string(), Some(LIST_PRICE_CODE.to_string())),
        "distribuidor" => ("mayoreo".to_string(), Some(LIST_PRICE_CODE.to_string())),
        "mayorista" => ("mayoreo_6".to_string(), Some(LIST_PRICE_CODE.to_string())),
        _ => (LIST_PRICE_CODE.to_string(), None),
    }
}
