// ABOUTME: Bearer token validation for platform-issued access tokens
// ABOUTME: HS256 JWT decoding plus header/body credential extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # Authentication
//!
//! This service does not mint credentials; it validates the HS256 access
//! tokens the managed auth platform issues to the mobile client. The token's
//! `sub` claim is the auth subject that keys blob namespaces and profile
//! rows.
//!
//! A missing credential is a validation failure (400, the client forgot the
//! field); a credential that fails to decode is an authentication failure
//! (401).

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::errors::{AppError, AppResult};

/// Claims extracted from a validated access token
#[derive(Debug, Clone)]
pub struct AccessClaims {
    /// Auth subject identifier (keys profiles and blob namespaces)
    pub sub: String,
    /// Email, when the platform includes it
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Validates platform-issued bearer tokens
#[derive(Clone)]
pub struct AuthValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthValidator {
    /// Create a validator from the platform's shared JWT secret
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Platform tokens carry an audience we do not police here
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    /// Returns an authentication error for any token that fails signature,
    /// expiry, or claim validation.
    pub fn validate(&self, token: &str) -> AppResult<AccessClaims> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::auth_invalid(format!("token validation failed: {e}")))?;
        Ok(AccessClaims {
            sub: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Extract a bearer token from the `Authorization` header
#[must_use]
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Resolve the request credential: `Authorization` header first, then the
/// optional body field some client variants use
///
/// # Errors
/// Returns a validation error (400) when neither carries a token.
pub fn token_from_request(headers: &HeaderMap, body_token: Option<&str>) -> AppResult<String> {
    bearer_from_headers(headers)
        .or_else(|| body_token.map(str::to_owned))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::validation("Access token not provided"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        email: String,
        exp: i64,
    }

    fn mint(secret: &[u8], exp_offset_secs: i64) -> String {
        let claims = TestClaims {
            sub: "subject-1".to_owned(),
            email: "cook@example.com".to_owned(),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_roundtrip() {
        let validator = AuthValidator::new(b"test-secret");
        let claims = validator.validate(&mint(b"test-secret", 3600)).unwrap();
        assert_eq!(claims.sub, "subject-1");
        assert_eq!(claims.email.as_deref(), Some("cook@example.com"));
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let validator = AuthValidator::new(b"test-secret");
        assert!(validator.validate(&mint(b"other-secret", 3600)).is_err());
    }

    #[test]
    fn test_validate_rejects_expired() {
        let validator = AuthValidator::new(b"test-secret");
        assert!(validator.validate(&mint(b"test-secret", -3600)).is_err());
    }

    #[test]
    fn test_token_from_request_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer header-token".parse().unwrap());
        let token = token_from_request(&headers, Some("body-token")).unwrap();
        assert_eq!(token, "header-token");
    }

    #[test]
    fn test_token_from_request_falls_back_to_body() {
        let headers = HeaderMap::new();
        let token = token_from_request(&headers, Some("body-token")).unwrap();
        assert_eq!(token, "body-token");
    }

    #[test]
    fn test_token_from_request_missing_is_400() {
        let headers = HeaderMap::new();
        let err = token_from_request(&headers, None).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }
}
