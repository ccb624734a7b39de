//! Bearer-token verification for the order endpoints.
//!
//! Tokens are issued elsewhere; this module only checks the HS256 signature
//! and expiry and hands the `id` claim to handlers as the caller's user id.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<i32, AppError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.id)
            .map_err(|e| {
                log::debug!("Rejected bearer token: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

/// The user on whose behalf the request is made.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i32);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let verifier = req
        .app_data::<web::Data<JwtVerifier>>()
        .ok_or_else(|| AppError::Internal("JwtVerifier is not registered".to_string()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Access denied: no token provided".to_string()))?;

    // Both "Bearer <token>" and a bare "<token>" are accepted.
    let token = match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        Some(_) => return Err(AppError::Unauthorized("Invalid or expired token".to_string())),
        None => header,
    };

    verifier.verify(token).map(AuthenticatedUser)
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test_secret_key";

    fn token(id: i32, secret: &str, ttl: Duration) -> String {
        let claims = Claims {
            id,
            exp: (Utc::now() + ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("encode token")
    }

    fn request(authorization: Option<String>) -> HttpRequest {
        let mut req = TestRequest::default().app_data(web::Data::new(JwtVerifier::new(SECRET)));
        if let Some(value) = authorization {
            req = req.insert_header((AUTHORIZATION, value));
        }
        req.to_http_request()
    }

    #[test]
    fn accepts_bearer_and_bare_tokens() {
        let t = token(42, SECRET, Duration::minutes(5));

        let user = authenticate(&request(Some(format!("Bearer {t}")))).unwrap();
        assert_eq!(user.0, 42);

        let user = authenticate(&request(Some(t))).unwrap();
        assert_eq!(user.0, 42);
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert!(matches!(authenticate(&request(None)), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn wrong_secret_or_expired_token_is_unauthorized() {
        let forged = token(1, "another_secret", Duration::minutes(5));
        let expired = token(1, SECRET, Duration::minutes(-10));

        for t in [forged, expired, "garbage".to_string()] {
            let result = authenticate(&request(Some(format!("Bearer {t}"))));
            assert!(matches!(result, Err(AppError::Unauthorized(_))));
        }
    }

    #[test]
    fn unknown_scheme_is_unauthorized() {
        let t = token(1, SECRET, Duration::minutes(5));
        let result = authenticate(&request(Some(format!("Basic {t}"))));

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
