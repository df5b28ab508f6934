//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create()         order row + item rows in ONE transaction             │
//! │  update_status()  status + admin notes + the lifecycle timestamp       │
//! │                   matching the target state (shipped_at/delivered_at/  │
//! │                   cancelled_at), server-set                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inventory side effects do NOT live here: the order service drives the
//! inventory repository after a transition is accepted.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use treadstock_core::{
    BillingInfo, Order, OrderFilter, OrderItem, OrderStatus, ShippingAddress, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.user_id, o.status, \
     o.shipping_street, o.shipping_exterior_number, o.shipping_interior_number, \
     o.shipping_neighborhood, o.shipping_postal_code, o.shipping_city, o.shipping_state, \
     o.shipping_reference, o.shipping_phone, \
     o.payment_method, o.payment_mode, o.payment_installments, o.payment_notes, \
     o.requires_invoice, o.billing_rfc, o.billing_business_name, o.billing_tax_regime, \
     o.billing_cfdi_use, o.billing_postal_code, o.billing_email, \
     o.subtotal, o.tax, o.shipping_cost, o.total, o.customer_notes, o.admin_notes, \
     o.created_at, o.updated_at, o.shipped_at, o.delivered_at, o.cancelled_at";

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and its items in one transaction.
    ///
    /// Fills in the generated id, order number, item ids and timestamps and
    /// returns the completed aggregate.
    pub async fn create(&self, mut order: Order) -> DbResult<Order> {
        let now = Utc::now();
        order.order_number = generate_order_number(now);
        order.created_at = now;
        order.updated_at = now;

        debug!(order_number = %order.order_number, items = order.items.len(), "Creating order");

        let mut tx = self.pool.begin().await?;

        let billing = order.billing_info.as_ref();

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                order_number, user_id, status,
                shipping_street, shipping_exterior_number, shipping_interior_number,
                shipping_neighborhood, shipping_postal_code, shipping_city, shipping_state,
                shipping_reference, shipping_phone,
                payment_method, payment_mode, payment_installments, payment_notes,
                requires_invoice, billing_rfc, billing_business_name, billing_tax_regime,
                billing_cfdi_use, billing_postal_code, billing_email,
                subtotal, tax, shipping_cost, total, customer_notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12,
                ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20,
                ?21, ?22, ?23,
                ?24, ?25, ?26, ?27, ?28,
                ?29, ?30
            )
            "#,
        )
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.exterior_number)
        .bind(&order.shipping_address.interior_number)
        .bind(&order.shipping_address.neighborhood)
        .bind(&order.shipping_address.postal_code)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.state)
        .bind(&order.shipping_address.reference)
        .bind(&order.shipping_address.phone)
        .bind(order.payment_method)
        .bind(order.payment_mode)
        .bind(order.payment_installments)
        .bind(&order.payment_notes)
        .bind(order.requires_invoice)
        .bind(billing.map(|b| b.rfc.clone()))
        .bind(billing.map(|b| b.business_name.clone()))
        .bind(billing.map(|b| b.tax_regime.clone()))
        .bind(billing.map(|b| b.cfdi_use.clone()))
        .bind(billing.map(|b| b.postal_code.clone()))
        .bind(billing.and_then(|b| b.email.clone()))
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(&order.customer_notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        order.id = result.last_insert_rowid();

        for item in &mut order.items {
            let result = sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, tire_sku, tire_size, tire_brand, tire_model,
                    quantity, unit_price, subtotal, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(order.id)
            .bind(&item.tire_sku)
            .bind(&item.tire_size)
            .bind(&item.tire_brand)
            .bind(&item.tire_model)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            item.id = result.last_insert_rowid();
            item.order_id = order.id;
            item.created_at = now;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Gets an order with its items by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut order = order_from_row(&row)?;
                order.items = self.get_items(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Gets an order with its items by order number.
    pub async fn get_by_order_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.order_number = ?1"
        ))
        .bind(order_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut order = order_from_row(&row)?;
                order.items = self.get_items(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Lists orders newest-first with their items, plus the total count.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<(Vec<Order>, i64)> {
        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let limit = match filter.limit {
            n if n <= 0 => DEFAULT_PAGE_SIZE,
            n if n > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            n => n,
        };
        let offset = filter.offset.max(0);

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders o"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY o.created_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(order_from_row(row)?);
        }

        for order in &mut orders {
            order.items = self.get_items(order.id).await?;
        }

        Ok((orders, total))
    }

    /// Persists a status change, optional admin notes, and the lifecycle
    /// timestamp matching the target state.
    pub async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        admin_notes: Option<&str>,
    ) -> DbResult<()> {
        debug!(id = id, status = %status, "Updating order status");

        // Column names come from this fixed match, never from input.
        let timestamp_clause = match status {
            OrderStatus::Enviado => ", shipped_at = ?3",
            OrderStatus::Entregado => ", delivered_at = ?3",
            OrderStatus::Cancelado => ", cancelled_at = ?3",
            _ => "",
        };

        let sql = format!(
            "UPDATE orders SET status = ?1, admin_notes = COALESCE(?2, admin_notes), \
             updated_at = ?3{timestamp_clause} WHERE id = ?4"
        );

        let result = sqlx::query(&sql)
            .bind(status)
            .bind(admin_notes)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Loads the items of one order, in insertion order.
    async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, tire_sku, tire_size, tire_brand, tire_model,
                   quantity, unit_price, subtotal, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items.into_iter().map(OrderItem::from).collect())
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &OrderFilter) {
    fn sep(qb: &mut QueryBuilder<Sqlite>, first: &mut bool) {
        qb.push(if *first { " WHERE " } else { " AND " });
        *first = false;
    }

    let mut first = true;

    if let Some(user_id) = filter.user_id.as_deref().map(str::trim) {
        if !user_id.is_empty() {
            sep(qb, &mut first);
            qb.push("o.user_id = ");
            qb.push_bind(user_id.to_string());
        }
    }

    if let Some(status) = filter.status {
        sep(qb, &mut first);
        qb.push("o.status = ");
        qb.push_bind(status);
    }

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            sep(qb, &mut first);
            qb.push("o.order_number LIKE ");
            qb.push_bind(format!("%{search}%"));
        }
    }
}

/// Generates an order number: ORD-YYYYMMDD-XXXXXX.
///
/// The random suffix keeps numbers unguessable; the UNIQUE index on
/// order_number backstops the (cosmically unlikely) collision.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        now.format("%Y%m%d"),
        suffix[..6].to_uppercase()
    )
}

/// Flat row type for order items (maps 1:1 onto the table).
#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    tire_sku: String,
    tire_size: String,
    tire_brand: Option<String>,
    tire_model: Option<String>,
    quantity: i64,
    unit_price: f64,
    subtotal: f64,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            tire_sku: row.tire_sku,
            tire_size: row.tire_size,
            tire_brand: row.tire_brand,
            tire_model: row.tire_model,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            created_at: row.created_at,
        }
    }
}

/// Maps a flat orders row onto the nested aggregate (items loaded apart).
fn order_from_row(row: &SqliteRow) -> Result<Order, DbError> {
    let billing_rfc: Option<String> = row.try_get("billing_rfc").map_err(DbError::from)?;

    let billing_info = match billing_rfc {
        Some(rfc) => Some(BillingInfo {
            rfc,
            business_name: row
                .try_get::<Option<String>, _>("billing_business_name")?
                .unwrap_or_default(),
            tax_regime: row
                .try_get::<Option<String>, _>("billing_tax_regime")?
                .unwrap_or_default(),
            cfdi_use: row
                .try_get::<Option<String>, _>("billing_cfdi_use")?
                .unwrap_or_default(),
            postal_code: row
                .try_get::<Option<String>, _>("billing_postal_code")?
                .unwrap_or_default(),
            email: row.try_get("billing_email")?,
        }),
        None => None,
    };

    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        user_id: row.try_get("user_id")?,
        status: row.try_get("status")?,
        shipping_address: ShippingAddress {
            street: row.try_get("shipping_street")?,
            exterior_number: row.try_get("shipping_exterior_number")?,
            interior_number: row.try_get("shipping_interior_number")?,
            neighborhood: row.try_get("shipping_neighborhood")?,
            postal_code: row.try_get("shipping_postal_code")?,
            city: row.try_get("shipping_city")?,
            state: row.try_get("shipping_state")?,
            reference: row.try_get("shipping_reference")?,
            phone: row.try_get("shipping_phone")?,
        },
        payment_method: row.try_get("payment_method")?,
        payment_mode: row.try_get("payment_mode")?,
        payment_installments: row.try_get("payment_installments")?,
        payment_notes: row.try_get("payment_notes")?,
        requires_invoice: row.try_get("requires_invoice")?,
        billing_info,
        items: Vec::new(),
        subtotal: row.try_get("subtotal")?,
        tax: row.try_get("tax")?,
        shipping_cost: row.try_get("shipping_cost")?,
        total: row.try_get("total")?,
        customer_notes: row.try_get("customer_notes")?,
        admin_notes: row.try_get("admin_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        shipped_at: row.try_get("shipped_at")?,
        delivered_at: row.try_get("delivered_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
    })
}
