// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request-scoped session context.
//!
//! The cookie carries `<id>.<hmac>`; the data lives in the injected
//! [`SessionStore`](crate::db::SessionStore). Handlers extract a [`Session`],
//! change `data`, and write it back explicitly.

use crate::error::{AppError, Result};
use crate::models::SessionData;
use crate::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "drive_fetch_session";

const TOKEN_BYTES: usize = 32;

/// Session loaded for the current request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: Option<String>,
    pub data: SessionData,
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(id) = jar
            .get(SESSION_COOKIE)
            .and_then(|c| verify_cookie_value(c.value(), &state.config.session_secret))
        else {
            return Ok(Session::default());
        };

        match state.sessions.load(&id).await {
            Ok(Some(data)) => Ok(Session { id: Some(id), data }),
            Ok(None) => Ok(Session::default()),
            Err(e) => {
                // An unreadable session counts as no session.
                tracing::warn!(error = %e, "Failed to load session");
                Ok(Session::default())
            }
        }
    }
}

impl Session {
    /// Store the data, allocating an id (and cookie) on first write.
    pub async fn save(&mut self, state: &AppState, jar: CookieJar) -> Result<CookieJar> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => {
                let id = random_token()?;
                self.id = Some(id.clone());
                id
            }
        };

        state.sessions.store(&id, &self.data).await?;
        let lifetime = if self.data.is_authenticated() {
            state.config.session_ttl
        } else {
            state.config.login_state_ttl
        };
        Ok(jar.add(session_cookie(state, &id, lifetime)?))
    }

    /// Store the data under a fresh id, dropping the old record.
    pub async fn rotate(&mut self, state: &AppState, jar: CookieJar) -> Result<CookieJar> {
        if let Some(old) = self.id.take() {
            state.sessions.remove(&old).await?;
        }
        self.save(state, jar).await
    }

    /// Update the existing record without touching the cookie.
    pub async fn persist(&self, state: &AppState) -> Result<()> {
        match &self.id {
            Some(id) => state.sessions.store(id, &self.data).await,
            None => Ok(()),
        }
    }

    /// Forget all session state and expire the cookie.
    pub async fn clear(self, state: &AppState, jar: CookieJar) -> CookieJar {
        if let Some(id) = &self.id {
            if let Err(e) = state.sessions.remove(id).await {
                tracing::warn!(error = %e, "Failed to remove session record");
            }
        }
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}

/// Random URL-safe token for session ids and OAuth state nonces.
pub fn random_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG unavailable")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn session_cookie(state: &AppState, id: &str, lifetime: Duration) -> Result<Cookie<'static>> {
    let max_age = time::Duration::seconds(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX));
    let value = sign_cookie_value(id, &state.config.session_secret)?;

    Ok(Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_https())
        .max_age(max_age)
        .build())
}

/// `<id>.<hex hmac(id)>`
pub fn sign_cookie_value(id: &str, secret: &[u8]) -> Result<String> {
    let signature = mac_for(id, secret)?.finalize().into_bytes();
    Ok(format!("{}.{}", id, hex::encode(signature)))
}

/// Session id from a signed cookie value, or `None` if it was tampered with.
pub fn verify_cookie_value(value: &str, secret: &[u8]) -> Option<String> {
    let (id, signature_hex) = value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    if mac_for(id, secret).ok()?.verify_slice(&signature).is_err() {
        tracing::warn!("Session cookie signature mismatch");
        return None;
    }

    Some(id.to_string())
}

fn mac_for(id: &str, secret: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(id.as_bytes());
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let secret = b"secret_key";
        let value = sign_cookie_value("abc123", secret).unwrap();

        assert!(value.starts_with("abc123."));
        assert_eq!(verify_cookie_value(&value, secret), Some("abc123".to_string()));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let value = sign_cookie_value("abc123", b"secret_key").unwrap();
        assert_eq!(verify_cookie_value(&value, b"wrong_key"), None);
    }

    #[test]
    fn test_verify_rejects_tampered_id() {
        let value = sign_cookie_value("abc123", b"secret_key").unwrap();
        let (_, sig) = value.rsplit_once('.').unwrap();
        assert_eq!(
            verify_cookie_value(&format!("abc124.{sig}"), b"secret_key"),
            None
        );
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert_eq!(verify_cookie_value("no-signature", b"k"), None);
        assert_eq!(verify_cookie_value("abc.not-hex", b"k"), None);
        assert_eq!(verify_cookie_value("", b"k"), None);
    }

    #[test]
    fn test_random_tokens_are_unique_and_url_safe() {
        let a = random_token().unwrap();
        let b = random_token().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains(['+', '/', '=', '.']));
    }
}
