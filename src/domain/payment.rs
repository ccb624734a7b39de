//! Payment strategies, one variant per supported payment method.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{CheckoutError, ValidationKind};
use super::ports::PaymentGateway;

pub const CREDIT_CARD: &str = "CreditCard";
pub const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_DESCRIPTION: &str = "Order payment";

/// Everything a strategy needs to charge a customer once.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: BigDecimal,
    pub currency: String,
    pub details: Map<String, Value>,
}

/// Opaque provider acknowledgment of a successful charge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeAck(pub Value);

/// Body posted to the card payment provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayCharge {
    pub amount: String,
    #[serde(rename = "card-number")]
    pub card_number: String,
    pub cvv: String,
    #[serde(rename = "expiration-month")]
    pub expiration_month: String,
    #[serde(rename = "expiration-year")]
    pub expiration_year: String,
    #[serde(rename = "full-name")]
    pub full_name: String,
    pub currency: String,
    pub description: String,
    pub reference: String,
}

#[derive(Clone)]
pub struct CreditCardStrategy {
    gateway: Arc<dyn PaymentGateway>,
}

impl CreditCardStrategy {
    const REQUIRED_FIELDS: [&'static str; 5] = [
        "cardNumber",
        "cvv",
        "expirationMonth",
        "expirationYear",
        "fullName",
    ];

    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    fn check_details(&self, details: &Map<String, Value>) -> Result<(), CheckoutError> {
        for field in Self::REQUIRED_FIELDS {
            required_text(details, field)?;
        }
        Ok(())
    }

    fn charge(&self, request: &ChargeRequest) -> Result<ChargeAck, CheckoutError> {
        if request.amount <= BigDecimal::zero() {
            return Err(CheckoutError::validation(
                ValidationKind::InvalidAmount,
                "Payment amount must be a positive number",
            ));
        }
        let details = &request.details;
        let charge = GatewayCharge {
            amount: request
                .amount
                .with_scale_round(2, RoundingMode::HalfUp)
                .to_string(),
            card_number: required_text(details, "cardNumber")?,
            cvv: required_text(details, "cvv")?,
            expiration_month: required_text(details, "expirationMonth")?,
            expiration_year: required_text(details, "expirationYear")?,
            full_name: required_text(details, "fullName")?,
            currency: if request.currency.is_empty() {
                DEFAULT_CURRENCY.to_string()
            } else {
                request.currency.clone()
            },
            description: optional_text(details, "description")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            reference: optional_text(details, "reference")
                .unwrap_or_else(|| format!("order-{}", uuid::Uuid::new_v4())),
        };
        self.gateway.submit(&charge)
    }
}

/// Closed set of payment methods the checkout knows how to charge.
#[derive(Clone)]
pub enum PaymentStrategy {
    CreditCard(CreditCardStrategy),
}

impl PaymentStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentStrategy::CreditCard(_) => CREDIT_CARD,
        }
    }

    /// Method-specific input checks; never touches the network.
    pub fn check_details(&self, details: &Map<String, Value>) -> Result<(), CheckoutError> {
        match self {
            PaymentStrategy::CreditCard(card) => card.check_details(details),
        }
    }

    /// Perform the single, non-retried provider round trip.
    pub fn charge(&self, request: &ChargeRequest) -> Result<ChargeAck, CheckoutError> {
        match self {
            PaymentStrategy::CreditCard(card) => card.charge(request),
        }
    }
}

/// Maps a payment method name to its strategy.
#[derive(Clone, Default)]
pub struct PaymentRegistry {
    strategies: HashMap<String, PaymentStrategy>,
}

impl PaymentRegistry {
    /// Registry with every built-in method wired to `gateway`.
    pub fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        let mut registry = Self::default();
        registry.register(PaymentStrategy::CreditCard(CreditCardStrategy::new(gateway)));
        registry
    }

    pub fn register(&mut self, strategy: PaymentStrategy) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn resolve(&self, method: &str) -> Result<&PaymentStrategy, CheckoutError> {
        self.strategies.get(method).ok_or_else(|| {
            CheckoutError::invalid_field(
                ValidationKind::UnsupportedMethod,
                "paymentMethod",
                format!("Unsupported payment method: {method}"),
            )
        })
    }
}

fn optional_text(details: &Map<String, Value>, key: &str) -> Option<String> {
    match details.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(details: &Map<String, Value>, key: &str) -> Result<String, CheckoutError> {
    optional_text(details, key).ok_or_else(|| {
        let field = format!("paymentDetails.{key}");
        CheckoutError::invalid_field(
            ValidationKind::MissingField,
            field.clone(),
            format!("{field} is required for card payments"),
        )
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::domain::errors::PaymentError;

    /// Gateway double that records every submitted charge.
    #[derive(Default)]
    pub struct RecordingGateway {
        pub calls: Mutex<Vec<GatewayCharge>>,
        pub reject_with: Option<PaymentError>,
    }

    impl RecordingGateway {
        pub fn rejecting(error: PaymentError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reject_with: Some(error),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl PaymentGateway for RecordingGateway {
        fn submit(&self, charge: &GatewayCharge) -> Result<ChargeAck, CheckoutError> {
            self.calls.lock().unwrap().push(charge.clone());
            match &self.reject_with {
                Some(err) => Err(CheckoutError::Payment(err.clone())),
                None => Ok(ChargeAck(json!({"status": "approved"}))),
            }
        }
    }

    pub fn card_details() -> Map<String, Value> {
        match json!({
            "cardNumber": "4111111111111111",
            "cvv": "123",
            "expirationMonth": "12",
            "expirationYear": 2030,
            "fullName": "Tester Card",
            "reference": "test-ref"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn request(amount: &str, details: Map<String, Value>) -> ChargeRequest {
        ChargeRequest {
            amount: BigDecimal::from_str(amount).unwrap(),
            currency: "EUR".to_string(),
            details,
        }
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let registry = PaymentRegistry::with_gateway(Arc::new(RecordingGateway::default()));
        let err = registry.resolve("Bitcoin").err().expect("should not resolve");

        assert_eq!(err.validation_kind(), Some(ValidationKind::UnsupportedMethod));
    }

    #[test]
    fn credit_card_submits_provider_payload() {
        let gateway = Arc::new(RecordingGateway::default());
        let registry = PaymentRegistry::with_gateway(gateway.clone());
        let strategy = registry.resolve(CREDIT_CARD).unwrap();

        let ack = strategy.charge(&request("41", card_details())).unwrap();

        assert_eq!(ack, ChargeAck(json!({"status": "approved"})));
        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].amount, "41.00");
        assert_eq!(calls[0].currency, "EUR");
        assert_eq!(calls[0].expiration_year, "2030");
        assert_eq!(calls[0].description, "Order payment");
        assert_eq!(calls[0].reference, "test-ref");
    }

    #[test]
    fn wire_payload_uses_provider_field_names() {
        let charge = GatewayCharge {
            amount: "1.00".into(),
            card_number: "4111".into(),
            cvv: "1".into(),
            expiration_month: "1".into(),
            expiration_year: "2030".into(),
            full_name: "A".into(),
            currency: "USD".into(),
            description: "d".into(),
            reference: "r".into(),
        };
        let body = serde_json::to_value(&charge).unwrap();

        assert_eq!(body["card-number"], "4111");
        assert_eq!(body["expiration-month"], "1");
        assert_eq!(body["full-name"], "A");
    }

    #[test]
    fn missing_card_field_fails_before_submitting() {
        let gateway = Arc::new(RecordingGateway::default());
        let strategy = PaymentStrategy::CreditCard(CreditCardStrategy::new(gateway.clone()));

        for field in ["cardNumber", "cvv", "expirationMonth", "expirationYear", "fullName"] {
            let mut details = card_details();
            details.remove(field);

            let err = strategy.charge(&request("10", details.clone())).unwrap_err();
            match err {
                CheckoutError::Validation {
                    kind: ValidationKind::MissingField,
                    field: Some(name),
                    ..
                } => assert_eq!(name, format!("paymentDetails.{field}")),
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(strategy.check_details(&details).is_err());
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let strategy =
            PaymentStrategy::CreditCard(CreditCardStrategy::new(Arc::new(RecordingGateway::default())));
        let mut details = card_details();
        details.insert("fullName".into(), json!("  "));

        assert!(strategy.check_details(&details).is_err());
    }

    #[test]
    fn non_positive_amount_is_rejected_without_submitting() {
        let gateway = Arc::new(RecordingGateway::default());
        let strategy = PaymentStrategy::CreditCard(CreditCardStrategy::new(gateway.clone()));

        for amount in ["0", "-3.50"] {
            let err = strategy.charge(&request(amount, card_details())).unwrap_err();
            assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidAmount));
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[test]
    fn provider_rejection_propagates_unchanged() {
        let rejection = PaymentError {
            reason: "Card declined".into(),
            provider: Some(json!({"message": "Card declined"})),
            status: 402,
        };
        let gateway = Arc::new(RecordingGateway::rejecting(rejection.clone()));
        let strategy = PaymentStrategy::CreditCard(CreditCardStrategy::new(gateway.clone()));

        match strategy.charge(&request("5", card_details())) {
            Err(CheckoutError::Payment(err)) => assert_eq!(err, rejection),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(gateway.call_count(), 1);
    }
}
