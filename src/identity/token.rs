//! Claim extraction from the bearer token returned by the auth service.
//! The token is not verified here; the server remains the authority.

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use super::role::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Shape,
    #[error("token payload is not base64url")]
    Encoding,
    #[error("token payload is not valid claims JSON")]
    Claims,
}

#[derive(Debug, Clone, Deserialize)]
struct RawClaims {
    sub: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub principal: String,
    pub role: Role,
}

pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Shape);
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    let raw: RawClaims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Claims)?;
    Ok(TokenClaims {
        principal: raw.sub,
        role: raw.role.as_deref().map(Role::parse).unwrap_or_default(),
    })
}

#[cfg(test)]
pub(crate) fn encode_test_token(sub: &str, role: &str) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = enc.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = enc.encode(serde_json::json!({"sub": sub, "role": role}).to_string());
    format!("{}.{}.c2ln", header, payload)
}
