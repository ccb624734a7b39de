//! Normalization of the raw `items` array of a checkout request.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{CheckoutError, ValidationKind};
use super::order::CartLine;

/// Validate raw cart entries and sum duplicate product ids.
///
/// Lines keep the position of the first occurrence of each product, so later
/// checks that report "the first offender" follow the caller's ordering.
pub fn normalize(raw_items: Option<&Value>) -> Result<Vec<CartLine>, CheckoutError> {
    let entries = match raw_items {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => {
            return Err(CheckoutError::invalid_field(
                ValidationKind::EmptyCart,
                "items",
                "At least one item is required to create an order",
            ))
        }
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
    let mut positions: HashMap<i32, usize> = HashMap::new();

    for entry in entries {
        let product_id = entry
            .get("productId")
            .and_then(positive_int)
            .ok_or_else(|| {
                CheckoutError::invalid_field(
                    ValidationKind::InvalidProductId,
                    "items",
                    "productId must be a positive integer",
                )
            })?;
        let quantity = entry.get("quantity").and_then(positive_int).ok_or_else(|| {
            CheckoutError::invalid_field(
                ValidationKind::InvalidQuantity,
                "items",
                "quantity must be an integer greater than zero",
            )
        })?;

        match positions.get(&product_id) {
            Some(&idx) => {
                let line = &mut lines[idx];
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    CheckoutError::invalid_field(
                        ValidationKind::InvalidQuantity,
                        "items",
                        "quantity is too large",
                    )
                })?;
            }
            None => {
                positions.insert(product_id, lines.len());
                lines.push(CartLine {
                    product_id,
                    quantity,
                });
            }
        }
    }

    Ok(lines)
}

/// Accepts JSON integers, integral floats and numeric strings ("5", "5.0", "1e1").
fn positive_int(value: &Value) -> Option<i32> {
    let n = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => integral(n.as_f64()?)?,
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => integral(s.parse::<f64>().ok()?)?,
            }
        }
        _ => return None,
    };
    i32::try_from(n).ok().filter(|n| *n > 0)
}

fn integral(f: f64) -> Option<i64> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    Some(f as i64)
}
