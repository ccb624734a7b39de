use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::CheckoutError;
use crate::domain::inventory::{PricedLine, ProductStock};
use crate::domain::order::{ListResult, OrderItemView, OrderStatus, OrderView, ProductSummary};
use crate::domain::ports::{CheckoutTx, OrderRepository};
use crate::schema::{order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow, ProductRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for CheckoutError {
    fn from(e: diesel::result::Error) -> Self {
        CheckoutError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for CheckoutError {
    fn from(e: r2d2::Error) -> Self {
        CheckoutError::Internal(e.to_string())
    }
}

// ── Checkout transaction ─────────────────────────────────────────────────────

struct DieselCheckoutTx<'a> {
    conn: &'a mut PgConnection,
}

impl CheckoutTx for DieselCheckoutTx<'_> {
    fn lock_products(&mut self, ids: &[i32]) -> Result<Vec<ProductStock>, CheckoutError> {
        // Ascending id order keeps lock acquisition consistent across checkouts.
        let rows = products::table
            .filter(products::id.eq_any(ids.to_vec()))
            .order(products::id.asc())
            .select(ProductRow::as_select())
            .for_update()
            .load(self.conn)?;

        Ok(rows
            .into_iter()
            .map(|p| ProductStock {
                id: p.id,
                name: p.name,
                price: p.price,
                stock: p.stock,
            })
            .collect())
    }

    fn deduct_stock(&mut self, product_id: i32, quantity: i32) -> Result<bool, CheckoutError> {
        let affected = diesel::update(
            products::table
                .filter(products::id.eq(product_id))
                .filter(products::stock.ge(quantity)),
        )
        .set((
            products::stock.eq(products::stock - quantity),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(self.conn)?;

        Ok(affected == 1)
    }

    fn insert_order(
        &mut self,
        user_id: i32,
        status: OrderStatus,
        total_amount: &BigDecimal,
        lines: &[PricedLine],
    ) -> Result<i32, CheckoutError> {
        let order_id: i32 = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                user_id,
                status: status.as_str().to_string(),
                total_amount: total_amount.clone(),
            })
            .returning(orders::id)
            .get_result(self.conn)?;

        let items: Vec<NewOrderItemRow> = lines
            .iter()
            .map(|l| NewOrderItemRow {
                order_id,
                product_id: l.product_id,
                quantity: l.quantity,
                unit_price: l.unit_price.clone(),
            })
            .collect();
        diesel::insert_into(order_items::table)
            .values(&items)
            .execute(self.conn)?;

        Ok(order_id)
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Attach items (with their product) to each order, keeping the input order.
fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, CheckoutError> {
    let ids: Vec<i32> = rows.iter().map(|o| o.id).collect();
    let item_rows: Vec<(OrderItemRow, ProductRow)> = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq_any(ids))
        .order(order_items::id.asc())
        .select((OrderItemRow::as_select(), ProductRow::as_select()))
        .load(conn)?;

    let mut by_order: HashMap<i32, Vec<OrderItemView>> = HashMap::new();
    for (item, product) in item_rows {
        by_order.entry(item.order_id).or_default().push(OrderItemView {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            product: Some(ProductSummary {
                id: product.id,
                name: product.name,
                slug: product.slug,
                price: product.price,
            }),
        });
    }

    rows.into_iter()
        .map(|o| {
            let status = o.status.parse::<OrderStatus>().map_err(CheckoutError::Internal)?;
            Ok(OrderView {
                id: o.id,
                user_id: o.user_id,
                status,
                total_amount: o.total_amount,
                created_at: o.created_at,
                updated_at: o.updated_at,
                items: by_order.remove(&o.id).unwrap_or_default(),
            })
        })
        .collect()
}

impl OrderRepository for DieselOrderRepository {
    fn transaction<T, F>(&self, work: F) -> Result<T, CheckoutError>
    where
        F: FnOnce(&mut dyn CheckoutTx) -> Result<T, CheckoutError>,
    {
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<_, CheckoutError, _>(|conn| {
            let mut tx = DieselCheckoutTx { conn };
            work(&mut tx)
        })
    }

    fn find_for_user(&self, user_id: i32, order_id: i32) -> Result<Option<OrderView>, CheckoutError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Ok(with_items(&mut conn, vec![order])?.pop())
    }

    fn list_for_user(&self, user_id: i32, page: i64, limit: i64) -> Result<ListResult, CheckoutError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1).saturating_mul(limit);
        conn.transaction::<_, CheckoutError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: with_items(conn, rows)?,
                total,
            })
        })
    }
}
