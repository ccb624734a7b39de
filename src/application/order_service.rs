use serde_json::Value;

use crate::domain::cart;
use crate::domain::errors::{CheckoutError, ValidationKind};
use crate::domain::inventory;
use crate::domain::order::{OrderPage, OrderStatus, OrderView};
use crate::domain::payment::{ChargeRequest, PaymentRegistry, DEFAULT_CURRENCY};
use crate::domain::ports::OrderRepository;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Checkout input as received from the caller, before any validation.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub items: Option<Value>,
    pub payment_method: Option<String>,
    pub payment_details: Option<Value>,
}

pub struct OrderService<R> {
    repo: R,
    payments: PaymentRegistry,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, payments: PaymentRegistry) -> Self {
        Self { repo, payments }
    }

    /// Validate, charge and persist an order for `user_id`.
    ///
    /// Everything that can be checked locally is checked before the provider
    /// is called. Stock is locked, charged against, deducted and the order
    /// written in a single transaction; any failure leaves no trace in the
    /// database. The charge itself is never retried.
    pub fn create_order(
        &self,
        user_id: i32,
        request: CheckoutRequest,
    ) -> Result<OrderView, CheckoutError> {
        let method = request
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                CheckoutError::invalid_field(
                    ValidationKind::MissingPaymentMethod,
                    "paymentMethod",
                    "paymentMethod is required",
                )
            })?;
        let details = match request.payment_details {
            Some(Value::Object(details)) => details,
            _ => {
                return Err(CheckoutError::invalid_field(
                    ValidationKind::InvalidPaymentDetails,
                    "paymentDetails",
                    "paymentDetails is required and must be an object",
                ))
            }
        };
        let lines = cart::normalize(request.items.as_ref())?;

        let strategy = self.payments.resolve(method)?;
        strategy.check_details(&details)?;
        let currency = details
            .get("currency")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();

        log::info!(
            "Checkout started: user={} products={} method={}",
            user_id,
            lines.len(),
            strategy.name()
        );

        let order_id = self.repo.transaction(|tx| {
            let ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
            let products = tx.lock_products(&ids)?;
            let priced = inventory::validate(&lines, &products)?;
            let total = priced.checked_total()?;

            // Row locks from `lock_products` are held across this call.
            let charge = ChargeRequest {
                amount: total.clone(),
                currency,
                details,
            };
            if let Err(err) = strategy.charge(&charge) {
                if let CheckoutError::Payment(rejection) = &err {
                    log::warn!(
                        "Payment rejected for user {} ({} {}): {}",
                        user_id,
                        total,
                        charge.currency,
                        rejection.reason
                    );
                }
                return Err(err);
            }

            for line in &priced.lines {
                if !tx.deduct_stock(line.product_id, line.quantity)? {
                    log::error!(
                        "Stock for product {} changed after payment for user {}; rolling back",
                        line.product_id,
                        user_id
                    );
                    return Err(CheckoutError::invalid_field(
                        ValidationKind::InsufficientStock,
                        "items",
                        format!("Insufficient stock for product {}", line.product_name),
                    ));
                }
            }

            tx.insert_order(user_id, OrderStatus::Completed, &total, &priced.lines)
        })?;

        log::info!("Order {} committed for user {}", order_id, user_id);

        self.repo
            .find_for_user(user_id, order_id)?
            .ok_or_else(|| {
                CheckoutError::Internal(format!("order {order_id} missing after commit"))
            })
    }

    /// Newest-first page of the caller's own orders.
    pub fn list_orders(
        &self,
        user_id: i32,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<OrderPage, CheckoutError> {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        // Any page past this one is empty anyway; keeps the row offset in range.
        let last_addressable = i64::MAX / page_size;
        let result = self
            .repo
            .list_for_user(user_id, page.min(last_addressable), page_size)?;
        let total_pages = ((result.total + page_size - 1) / page_size).max(1);

        Ok(OrderPage {
            orders: result.items,
            total_count: result.total,
            page,
            page_size,
            total_pages,
        })
    }

    /// Orders of other users are reported exactly like missing ones.
    pub fn get_order(&self, user_id: i32, order_id: i32) -> Result<OrderView, CheckoutError> {
        self.repo
            .find_for_user(user_id, order_id)?
            .ok_or(CheckoutError::NotFound)
    }
}
