use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::application::order_service::{CheckoutRequest, OrderService};
use crate::auth::AuthenticatedUser;
use crate::domain::order::{OrderItemView, OrderPage, OrderView, ProductSummary};
use crate::errors::AppError;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::jsend::JSend;

pub type Orders = OrderService<DieselOrderRepository>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Cart lines, e.g. `[{"productId": 5, "quantity": 2}]`. Repeated products are summed.
    #[schema(value_type = Vec<Object>)]
    pub items: Option<Value>,
    /// Payment method name, e.g. "CreditCard"
    pub payment_method: Option<String>,
    /// Method-specific fields. For "CreditCard": cardNumber, cvv, expirationMonth,
    /// expirationYear, fullName and optionally currency, description, reference.
    #[schema(value_type = Object)]
    pub payment_details: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSummaryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    /// Price per unit at checkout time, as a decimal string
    pub unit_price: String,
    pub product: Option<ProductSummaryResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: String,
    pub total_amount: String,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageResponse {
    pub orders: Vec<OrderResponse>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

fn money(value: &BigDecimal) -> String {
    value.with_scale_round(2, RoundingMode::HalfUp).to_string()
}

impl From<ProductSummary> for ProductSummaryResponse {
    fn from(p: ProductSummary) -> Self {
        Self {
            id: p.id,
            name: p.name,
            slug: p.slug,
            price: money(&p.price),
        }
    }
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: money(&item.unit_price),
            product: item.product.map(Into::into),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status.to_string(),
            total_amount: money(&order.total_amount),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderPage> for OrderPageResponse {
    fn from(page: OrderPage) -> Self {
        Self {
            orders: page.orders.into_iter().map(Into::into).collect(),
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

/// Values are parsed leniently: anything that is not a positive integer
/// falls back to the default.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<String>,
    /// Items per page. Defaults to 10, maximum 100.
    #[serde(alias = "pageSize")]
    pub limit: Option<String>,
}

fn lenient_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the cart against current stock, charges the payment method and
/// records the completed order. Nothing is persisted when any step fails.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order paid and created (JSend success)", body = OrderResponse),
        (status = 400, description = "Invalid cart, insufficient stock or bad payment details"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 402, description = "Payment rejected by the provider"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    orders: web::Data<Orders>,
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = CheckoutRequest {
        items: body.items,
        payment_method: body.payment_method,
        payment_details: body.payment_details,
    };

    let order = web::block(move || orders.create_order(user.0, request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(JSend::success(OrderResponse::from(order))))
}

/// GET /orders/{id}
///
/// Returns one of the caller's orders with its items. Orders owned by
/// someone else are reported as not found.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found (JSend success)", body = OrderResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    orders: web::Data<Orders>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id: i32 = path.trim().parse().map_err(|_| AppError::NotFound)?;

    let order = web::block(move || orders.get_order(user.0, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(JSend::success(OrderResponse::from(order))))
}

/// GET /orders
///
/// Returns the caller's orders, newest first, with their items.
/// Use `page` (1-based) and `limit` (or `pageSize`) to control pagination.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders (JSend success)", body = OrderPageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    orders: web::Data<Orders>,
    user: AuthenticatedUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = lenient_int(params.page.as_deref());
    let limit = lenient_int(params.limit.as_deref());

    let result = web::block(move || orders.list_orders(user.0, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(JSend::success(OrderPageResponse::from(result))))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;

    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn order_response_renders_money_with_two_decimals() {
        let now = Utc::now();
        let order = OrderView {
            id: 1,
            user_id: 2,
            status: OrderStatus::Completed,
            total_amount: BigDecimal::from(41),
            created_at: now,
            updated_at: now,
            items: vec![OrderItemView {
                id: 3,
                product_id: 4,
                quantity: 2,
                unit_price: BigDecimal::from_str("20.5").unwrap(),
                product: None,
            }],
        };

        let body = serde_json::to_value(OrderResponse::from(order)).unwrap();

        assert_eq!(body["totalAmount"], "41.00");
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["userId"], 2);
        assert_eq!(body["items"][0]["unitPrice"], "20.50");
        assert_eq!(body["items"][0]["productId"], 4);
    }

    #[test]
    fn pagination_values_parse_leniently() {
        assert_eq!(lenient_int(Some("3")), Some(3));
        assert_eq!(lenient_int(Some(" -1 ")), Some(-1));
        assert_eq!(lenient_int(Some("abc")), None);
        assert_eq!(lenient_int(None), None);
    }
}
