use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::SessionClaims,
    error::{AppError, AppResult},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "storefront_session";

/// Signs and verifies the session cookie. The cookie only names a session;
/// everything else lives server-side in the `sessions` table.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn encode(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<String> {
        let claims = SessionClaims {
            sub: session_id.to_string(),
            exp: expires_at.timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// `None` for anything forged, expired or malformed.
    pub fn decode(&self, token: &str) -> Option<Uuid> {
        let decoded = decode::<SessionClaims>(token, &self.decoding, &Validation::default()).ok()?;
        Uuid::parse_str(&decoded.claims.sub).ok()
    }

    pub fn cookie(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<HeaderValue> {
        let token = self.encode(session_id, expires_at)?;
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
        ))
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn expired_cookie() -> HeaderValue {
        HeaderValue::from_static(
            "storefront_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        )
    }
}

/// The session a request claims to belong to. Missing or invalid cookies
/// yield an anonymous token rather than a rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionToken(Option<Uuid>);

impl SessionToken {
    pub fn new(session_id: Uuid) -> Self {
        Self(Some(session_id))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn id(&self) -> Option<Uuid> {
        self.0
    }
}

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = cookie_value(&parts.headers, SESSION_COOKIE)
            .and_then(|token| state.sessions.decode(token));
        if session_id.is_none() && parts.headers.contains_key(header::COOKIE) {
            tracing::debug!("request carries no usable session cookie");
        }
        Ok(SessionToken(session_id))
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; storefront_session=abc.def; lang=en"),
        );
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("storefront_session="));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn token_roundtrips_and_rejects_other_secrets() {
        let keys = SessionKeys::new("secret-a", 1);
        let other = SessionKeys::new("secret-b", 1);
        let id = Uuid::new_v4();
        let token = keys.encode(id, Utc::now() + keys.ttl()).unwrap();

        assert_eq!(keys.decode(&token), Some(id));
        assert_eq!(other.decode(&token), None);
        assert_eq!(keys.decode("not-a-token"), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("secret", 1);
        let token = keys
            .encode(Uuid::new_v4(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(keys.decode(&token), None);
    }
}
