//! Tokens the issuer mints when it calls back into this server.
//!
//! Both hooks (login success and code delivery) carry an HS256 JWT signed with
//! the shared `hook_secret`. The `action` claim pins a token to one hook so a
//! code-delivery token cannot complete a login.

use crate::error::HookError;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookAction {
    LoginSuccess,
    SendCode,
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookAction::LoginSuccess => f.write_str("login-success"),
            HookAction::SendCode => f.write_str("send-code"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HookClaims {
    pub exp: usize,
    pub email: String,
    pub action: HookAction,
}

#[derive(Clone)]
pub struct HookKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl HookKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token for `action`, valid for `ttl`.
    pub fn mint(
        &self,
        action: HookAction,
        email: &str,
        ttl: time::Duration,
    ) -> Result<String, HookError> {
        let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp() as usize;
        let claims = HookClaims {
            exp,
            email: email.to_string(),
            action,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify signature and expiry, then check the token was minted for `expected`.
    pub fn verify(&self, token: &str, expected: HookAction) -> Result<HookClaims, HookError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let claims = decode::<HookClaims>(token, &self.decoding, &validation)?.claims;
        if claims.action != expected {
            return Err(HookError::WrongAction(claims.action.to_string()));
        }
        Ok(claims)
    }

    /// Verify the `Authorization: Bearer` token in `headers`.
    pub fn verify_bearer(
        &self,
        headers: &HeaderMap,
        expected: HookAction,
    ) -> Result<HookClaims, HookError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(HookError::MissingToken)?;
        self.verify(token, expected)
    }
}

impl fmt::Debug for HookKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HookKeys(..)")
    }
}
