use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_PAYMENT_STATUS: u16 = 402;

/// Machine-readable reason for a client-correctable checkout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    EmptyCart,
    InvalidQuantity,
    InvalidProductId,
    MissingProduct,
    InsufficientStock,
    MissingPaymentMethod,
    InvalidPaymentDetails,
    UnsupportedMethod,
    MissingField,
    InvalidAmount,
}

impl ValidationKind {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationKind::EmptyCart => "EMPTY_CART",
            ValidationKind::InvalidQuantity => "INVALID_QUANTITY",
            ValidationKind::InvalidProductId => "INVALID_PRODUCT_ID",
            ValidationKind::MissingProduct => "MISSING_PRODUCT",
            ValidationKind::InsufficientStock => "INSUFFICIENT_STOCK",
            ValidationKind::MissingPaymentMethod => "MISSING_PAYMENT_METHOD",
            ValidationKind::InvalidPaymentDetails => "INVALID_PAYMENT_DETAILS",
            ValidationKind::UnsupportedMethod => "UNSUPPORTED_METHOD",
            ValidationKind::MissingField => "MISSING_FIELD",
            ValidationKind::InvalidAmount => "INVALID_AMOUNT",
        }
    }
}

/// A charge the payment provider refused, or could not be reached for.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentError {
    pub reason: String,
    /// Raw provider body, kept for support and debugging.
    pub provider: Option<Value>,
    pub status: u16,
}

impl PaymentError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            provider: None,
            status: DEFAULT_PAYMENT_STATUS,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{message}")]
    Validation {
        kind: ValidationKind,
        field: Option<String>,
        message: String,
    },
    #[error("Payment failed: {}", .0.reason)]
    Payment(PaymentError),
    #[error("Order not found")]
    NotFound,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    pub fn validation(kind: ValidationKind, message: impl Into<String>) -> Self {
        CheckoutError::Validation {
            kind,
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(
        kind: ValidationKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CheckoutError::Validation {
            kind,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            CheckoutError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
