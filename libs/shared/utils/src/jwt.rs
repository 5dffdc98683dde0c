use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{JwtClaims, JwtHeader, User};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid signature encoding")]
    BadSignatureEncoding,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid claims: {0}")]
    BadClaims(String),

    #[error("Token expired")]
    Expired,
}

/// Verify an HS256 token and turn its claims into a `User`.
///
/// The clinic role and role-table id are read from top-level `role`/`role_id`
/// claims first and fall back to `app_metadata`, where Supabase keeps custom
/// claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, TokenError> {
    if jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err(TokenError::Malformed),
    };

    let header: JwtHeader = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(TokenError::Malformed)?;

    if header.alg != "HS256" {
        debug!("Rejecting token signed with {}", header.alg);
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::BadSignatureEncoding
    })?;

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| TokenError::MissingSecret)?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(TokenError::BadSignature);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::BadClaims("encoding".to_string()))?;

    let claims: JwtClaims = serde_json::from_slice(&claims_bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::BadClaims(e.to_string())
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err(TokenError::Expired);
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let metadata_role = claims
        .app_metadata
        .as_ref()
        .and_then(|meta| meta.get("role"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let metadata_role_id = claims
        .app_metadata
        .as_ref()
        .and_then(|meta| meta.get("role_id"))
        .and_then(Value::as_i64);

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role.or(metadata_role),
        role_id: claims.role_id.or(metadata_role_id),
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};
    use assert_matches::assert_matches;

    const SECRET: &str = "test-secret";

    #[test]
    fn valid_token_yields_role_and_role_id() {
        let user = TestUser::receptionist(7);
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(1));

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.role.as_deref(), Some("Receptionist"));
        assert_eq!(validated.role_id, Some(7));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = JwtTestUtils::create_expired_token(&TestUser::patient(10), SECRET);
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtTestUtils::create_invalid_signature_token(&TestUser::patient(10));
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(validate_token("a.b", SECRET).unwrap_err(), TokenError::Malformed);
        assert_eq!(validate_token("a.b.c.d", SECRET).unwrap_err(), TokenError::Malformed);
        assert_eq!(validate_token("x.y.z", "").unwrap_err(), TokenError::MissingSecret);
    }

    #[test]
    fn only_hs256_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let token = JwtTestUtils::create_test_token(&TestUser::patient(10), SECRET, Some(1));
        let forged = format!("{}.{}", header, token.split_once('.').unwrap().1);

        assert_matches!(validate_token(&forged, SECRET), Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "none");
    }

    #[test]
    fn role_falls_back_to_app_metadata() {
        let token = JwtTestUtils::create_token_with_app_metadata("99", "dentist", 5, SECRET);

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.role.as_deref(), Some("dentist"));
        assert_eq!(validated.role_id, Some(5));
    }
}
