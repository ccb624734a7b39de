use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::errors::{CheckoutError, PaymentError};
use crate::jsend::JSend;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        reason: &'static str,
        field: Option<String>,
        message: String,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{}", .0.reason)]
    Payment(PaymentError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Order not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation {
                kind,
                field,
                message,
            } => AppError::Validation {
                reason: kind.code(),
                field,
                message,
            },
            CheckoutError::Payment(err) => AppError::Payment(err),
            CheckoutError::NotFound => AppError::NotFound,
            CheckoutError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[derive(Serialize)]
struct FailData<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a Value>,
}

impl FailData<'_> {
    fn message(message: &str) -> FailData<'_> {
        FailData {
            message,
            reason: None,
            field: None,
            provider: None,
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Payment(err) => StatusCode::from_u16(err.status)
                .ok()
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::PAYMENT_REQUIRED),
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation {
                reason,
                field,
                message,
            } => builder.json(JSend::fail(FailData {
                message,
                reason: Some(*reason),
                field: field.as_deref(),
                provider: None,
            })),
            AppError::BadRequest(message) => builder.json(JSend::fail(FailData::message(message))),
            AppError::Payment(err) => builder.json(JSend::fail(FailData {
                message: &err.reason,
                reason: Some("PAYMENT_REJECTED"),
                field: None,
                provider: err.provider.as_ref(),
            })),
            AppError::NotFound => builder.json(JSend::fail(FailData::message("Order not found"))),
            AppError::Unauthorized(message) => builder.json(JSend::error(message.as_str())),
            AppError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                builder.json(JSend::error("Internal server error"))
            }
        }
    }
}
