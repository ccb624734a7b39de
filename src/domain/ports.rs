use bigdecimal::BigDecimal;

use super::errors::CheckoutError;
use super::inventory::{PricedLine, ProductStock};
use super::order::{ListResult, OrderStatus, OrderView};
use super::payment::{ChargeAck, GatewayCharge};

/// External card payment provider. One call is one charge attempt.
pub trait PaymentGateway: Send + Sync + 'static {
    fn submit(&self, charge: &GatewayCharge) -> Result<ChargeAck, CheckoutError>;
}

/// Writes available to a checkout while its transaction is open.
pub trait CheckoutTx {
    /// Read the given products and hold them against concurrent checkouts
    /// until the transaction ends. Unknown ids are simply absent.
    fn lock_products(&mut self, ids: &[i32]) -> Result<Vec<ProductStock>, CheckoutError>;

    /// Decrement stock only if enough is left. Returns `false` otherwise.
    fn deduct_stock(&mut self, product_id: i32, quantity: i32) -> Result<bool, CheckoutError>;

    fn insert_order(
        &mut self,
        user_id: i32,
        status: OrderStatus,
        total_amount: &BigDecimal,
        lines: &[PricedLine],
    ) -> Result<i32, CheckoutError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Run `work` atomically: every write it made is rolled back if it fails.
    fn transaction<T, F>(&self, work: F) -> Result<T, CheckoutError>
    where
        F: FnOnce(&mut dyn CheckoutTx) -> Result<T, CheckoutError>;

    /// Only returns the order when it belongs to `user_id`.
    fn find_for_user(&self, user_id: i32, order_id: i32) -> Result<Option<OrderView>, CheckoutError>;

    fn list_for_user(&self, user_id: i32, page: i64, limit: i64) -> Result<ListResult, CheckoutError>;
}
