//! Stock validation and pricing of a normalized cart.
//!
//! The functions here are pure; callers are expected to hand in product rows
//! read inside the same transaction that will later deduct stock.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::errors::{CheckoutError, ValidationKind};
use super::order::CartLine;

/// Current catalog state of a product as seen by the checkout.
#[derive(Debug, Clone)]
pub struct ProductStock {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// `orders.total_amount` is NUMERIC(10, 2); a recordable total stays below this.
pub const ORDER_TOTAL_CEILING: i64 = 100_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
}

impl PricedCart {
    /// Sum of `quantity * unit_price`, rounded half-up to cents once, at the end.
    pub fn total(&self) -> BigDecimal {
        let sum = self
            .lines
            .iter()
            .fold(BigDecimal::zero(), |acc, line| {
                acc + &line.unit_price * BigDecimal::from(line.quantity)
            });
        sum.with_scale_round(2, RoundingMode::HalfUp)
    }

    /// Like [`total`](Self::total), but fails when the order could not be stored.
    pub fn checked_total(&self) -> Result<BigDecimal, CheckoutError> {
        let total = self.total();
        if total >= BigDecimal::from(ORDER_TOTAL_CEILING) {
            return Err(CheckoutError::invalid_field(
                ValidationKind::InvalidAmount,
                "items",
                format!("Order total {total} exceeds the maximum of 99999999.99"),
            ));
        }
        Ok(total)
    }
}

/// Check every cart line against `products` and snapshot current prices.
///
/// Missing products are reported before stock shortages; within each check
/// the first offending line in cart order wins.
pub fn validate(lines: &[CartLine], products: &[ProductStock]) -> Result<PricedCart, CheckoutError> {
    let by_id: HashMap<i32, &ProductStock> = products.iter().map(|p| (p.id, p)).collect();

    if let Some(missing) = lines.iter().find(|l| !by_id.contains_key(&l.product_id)) {
        return Err(CheckoutError::invalid_field(
            ValidationKind::MissingProduct,
            "items",
            format!("Product {} does not exist", missing.product_id),
        ));
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = by_id[&line.product_id];
        if product.stock < line.quantity {
            return Err(CheckoutError::invalid_field(
                ValidationKind::InsufficientStock,
                "items",
                format!("Insufficient stock for product {}", product.name),
            ));
        }
        priced.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price.clone(),
        });
    }

    Ok(PricedCart { lines: priced })
}
