//! Access-token expiry inspection.
//!
//! Tokens are three dot-separated segments whose middle segment is a
//! base64url JSON object carrying `exp` (seconds since the epoch). Nothing
//! here verifies signatures; the backend does that. Anything that cannot be
//! decoded is reported as expired.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Why a token's expiry could not be read.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedToken {
    #[error("token does not have three segments")]
    Structure,

    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload has no numeric exp claim: {0}")]
    Claims(String),
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Decode the `exp` claim (seconds since the epoch) from a token.
pub fn decode_expiry(token: &str) -> Result<f64, MalformedToken> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(MalformedToken::Structure);
    }

    // Some issuers pad the payload segment.
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| MalformedToken::Encoding(e.to_string()))?;
    let claim: ExpiryClaim =
        serde_json::from_slice(&payload).map_err(|e| MalformedToken::Claims(e.to_string()))?;

    if !claim.exp.is_finite() {
        return Err(MalformedToken::Claims("exp is not finite".to_string()));
    }
    Ok(claim.exp)
}

/// Whether `token` is expired at `now_ms` (milliseconds since the epoch).
///
/// `None` and undecodable tokens are expired. Otherwise the token is
/// expired iff `exp * 1000 < now_ms`, so a token whose expiry equals the
/// current millisecond is still valid.
pub fn is_expired_at(token: Option<&str>, now_ms: i64) -> bool {
    let Some(token) = token else {
        return true;
    };
    match decode_expiry(token) {
        Ok(exp) => exp * 1000.0 < now_ms as f64,
        Err(_) => true,
    }
}

/// Whether `token` is expired against the current wall clock.
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now().timestamp_millis())
}

/// Expiry instant of `token`, if it can be decoded.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_expiry(token).ok()?;
    Utc.timestamp_millis_opt((exp * 1000.0) as i64).single()
}

/// Build an unsigned token carrying `claims`, for tests.
#[cfg(test)]
pub(crate) fn encode_unsigned(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signature = URL_SAFE_NO_PAD.encode("fake-signature");
    format!("{}.{}.{}", header, payload, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_none_is_expired() {
        assert!(is_expired(None));
        assert!(is_expired_at(None, 0));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = encode_unsigned(&json!({ "exp": 1_700_000_000 }));
        let exp_ms = 1_700_000_000_000i64;

        assert!(!is_expired_at(Some(&token), exp_ms - 1));
        assert!(!is_expired_at(Some(&token), exp_ms));
        assert!(is_expired_at(Some(&token), exp_ms + 1));
    }

    #[test]
    fn test_wall_clock() {
        let now = Utc::now().timestamp();
        let past = encode_unsigned(&json!({ "exp": now - 1 }));
        let future = encode_unsigned(&json!({ "exp": now + 3600 }));

        assert!(is_expired(Some(&past)));
        assert!(!is_expired(Some(&future)));
    }

    #[test]
    fn test_fractional_exp() {
        let token = encode_unsigned(&json!({ "exp": 100.5 }));
        assert_eq!(decode_expiry(&token), Ok(100.5));
        assert!(!is_expired_at(Some(&token), 100_500));
        assert!(is_expired_at(Some(&token), 100_501));
    }

    #[test]
    fn test_malformed_structure() {
        assert_eq!(decode_expiry("not-a-jwt"), Err(MalformedToken::Structure));
        assert_eq!(decode_expiry("only.two"), Err(MalformedToken::Structure));
        assert_eq!(decode_expiry("a.b.c.d"), Err(MalformedToken::Structure));
        assert!(is_expired(Some("")));
        assert!(is_expired(Some("not-a-jwt")));
    }

    #[test]
    fn test_invalid_payload() {
        assert!(matches!(
            decode_expiry("header.!!!invalid-base64!!!.signature"),
            Err(MalformedToken::Encoding(_))
        ));
        assert!(is_expired(Some("header.!!!invalid-base64!!!.signature")));
    }

    #[test]
    fn test_missing_or_non_numeric_exp() {
        let missing = encode_unsigned(&json!({ "sub": "user123" }));
        let text = encode_unsigned(&json!({ "exp": "tomorrow" }));

        assert!(matches!(decode_expiry(&missing), Err(MalformedToken::Claims(_))));
        assert!(matches!(decode_expiry(&text), Err(MalformedToken::Claims(_))));
        assert!(is_expired_at(Some(&missing), 0));
        assert!(is_expired_at(Some(&text), 0));
    }

    #[test]
    fn test_padded_payload_segment() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":42}"#);
        let token = format!("{}.{}.sig", header, payload);
        assert_eq!(decode_expiry(&token), Ok(42.0));
    }

    #[test]
    fn test_expires_at() {
        let token = encode_unsigned(&json!({ "exp": 1_700_000_000 }));
        let at = expires_at(&token).unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert!(expires_at("garbage").is_none());
    }
}
