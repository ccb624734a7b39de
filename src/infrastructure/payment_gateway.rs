use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::config::PaymentConfig;
use crate::domain::errors::{CheckoutError, PaymentError, DEFAULT_PAYMENT_STATUS};
use crate::domain::payment::{ChargeAck, GatewayCharge};
use crate::domain::ports::PaymentGateway;

/// Card provider reached over HTTPS with a bearer token.
///
/// Uses the blocking client: charges are issued from inside a Diesel
/// transaction, which already runs on actix's blocking pool.
pub struct HttpPaymentGateway {
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpPaymentGateway {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            timeout,
        }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl PaymentGateway for HttpPaymentGateway {
    fn submit(&self, charge: &GatewayCharge) -> Result<ChargeAck, CheckoutError> {
        let token = self.token.as_deref().ok_or_else(|| {
            CheckoutError::Internal("FAKE_PAYMENT_TOKEN is not configured".to_string())
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CheckoutError::Internal(format!("payment client: {e}")))?;

        let response = client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(charge)
            .send()
            .map_err(|e| {
                log::warn!("Payment gateway request failed: {}", e);
                CheckoutError::Payment(PaymentError::rejected("Payment gateway unreachable"))
            })?;

        let status = response.status();
        let body = response.text().ok().and_then(|text| parse_body(&text));

        if status.is_success() {
            return Ok(ChargeAck(body.unwrap_or(Value::Null)));
        }

        let reason = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Payment rejected by the gateway ({status})"));

        Err(CheckoutError::Payment(PaymentError {
            reason,
            provider: body,
            status: surfaced_status(status),
        }))
    }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// Provider 4xx codes pass through, except auth failures which concern our
/// own credentials rather than the customer's payment.
fn surfaced_status(status: StatusCode) -> u16 {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DEFAULT_PAYMENT_STATUS,
        s if s.is_client_error() => s.as_u16(),
        _ => DEFAULT_PAYMENT_STATUS,
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::{json, Value};

    use super::*;

    const TOKEN: &str = "test_payment_token";

    async fn fake_provider(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
        let authorized = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            == Some("Bearer test_payment_token");
        if !authorized {
            return HttpResponse::Unauthorized().json(json!({"message": "bad token"}));
        }
        match body["card-number"].as_str() {
            Some("4000000000000002") => {
                HttpResponse::PaymentRequired().json(json!({"message": "Card declined"}))
            }
            Some("4000000000000119") => HttpResponse::InternalServerError().body("boom"),
            Some("4000000000000127") => {
                HttpResponse::UnprocessableEntity().json(json!({"message": "Invalid CVV"}))
            }
            _ => HttpResponse::Ok().json(json!({"status": "approved", "amount": body["amount"]})),
        }
    }

    fn start_provider() -> SocketAddr {
        let server = HttpServer::new(|| App::new().route("/payments", web::post().to(fake_provider)))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("bind failed");
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        addr
    }

    fn charge(card_number: &str) -> GatewayCharge {
        GatewayCharge {
            amount: "41.00".into(),
            card_number: card_number.into(),
            cvv: "123".into(),
            expiration_month: "12".into(),
            expiration_year: "2030".into(),
            full_name: "Tester Card".into(),
            currency: "USD".into(),
            description: "Order payment".into(),
            reference: "test-ref".into(),
        }
    }

    async fn submit(
        gateway: HttpPaymentGateway,
        card_number: &str,
    ) -> Result<ChargeAck, CheckoutError> {
        let charge = charge(card_number);
        tokio::task::spawn_blocking(move || gateway.submit(&charge))
            .await
            .expect("blocking task panicked")
    }

    fn gateway(addr: SocketAddr, token: Option<&str>) -> HttpPaymentGateway {
        HttpPaymentGateway::new(
            format!("http://{addr}/payments"),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
    }

    #[actix_web::test]
    async fn approved_charge_returns_provider_body() {
        let addr = start_provider();

        let ack = submit(gateway(addr, Some(TOKEN)), "4111111111111111")
            .await
            .expect("charge should succeed");

        assert_eq!(ack.0["status"], "approved");
        assert_eq!(ack.0["amount"], "41.00");
    }

    #[actix_web::test]
    async fn declined_charge_surfaces_provider_message() {
        let addr = start_provider();

        match submit(gateway(addr, Some(TOKEN)), "4000000000000002").await {
            Err(CheckoutError::Payment(err)) => {
                assert_eq!(err.reason, "Card declined");
                assert_eq!(err.status, 402);
                assert_eq!(err.provider, Some(json!({"message": "Card declined"})));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn specific_client_error_status_is_kept() {
        let addr = start_provider();

        match submit(gateway(addr, Some(TOKEN)), "4000000000000127").await {
            Err(CheckoutError::Payment(err)) => assert_eq!(err.status, 422),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn provider_server_error_is_a_payment_rejection() {
        let addr = start_provider();

        match submit(gateway(addr, Some(TOKEN)), "4000000000000119").await {
            Err(CheckoutError::Payment(err)) => {
                assert_eq!(err.status, 402);
                assert_eq!(err.provider, Some(Value::String("boom".into())));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn rejected_credentials_do_not_leak_as_401() {
        let addr = start_provider();

        match submit(gateway(addr, Some("wrong")), "4111111111111111").await {
            Err(CheckoutError::Payment(err)) => assert_eq!(err.status, 402),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn missing_token_is_an_internal_error() {
        let addr = start_provider();

        let result = submit(gateway(addr, None), "4111111111111111").await;

        assert!(matches!(result, Err(CheckoutError::Internal(_))));
    }

    #[actix_web::test]
    async fn unreachable_provider_is_a_payment_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("bind failed")
            .port();
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();

        match submit(gateway(addr, Some(TOKEN)), "4111111111111111").await {
            Err(CheckoutError::Payment(err)) => {
                assert_eq!(err.status, 402);
                assert!(err.provider.is_none());
                assert_eq!(err.reason, "Payment gateway unreachable");
                assert!(!err.reason.contains("127.0.0.1"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
