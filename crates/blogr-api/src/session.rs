//! Signed session tokens carried in the `session` cookie.

use anyhow::{Context, anyhow};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use blogr_types::api::SessionClaims;

pub const SESSION_COOKIE: &str = "session";

/// Signs and checks session tokens with the server secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token naming `user_id`.
    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow!("session lifetime {} overflows the clock", self.ttl))?;

        let claims = SessionClaims {
            sub: user_id,
            iat: unix_seconds(now)?,
            exp: unix_seconds(expires)?,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// The user id a token names, if its signature and expiry check out.
    pub fn verify(&self, token: &str) -> Option<i64> {
        match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

fn unix_seconds(at: DateTime<Utc>) -> anyhow::Result<usize> {
    usize::try_from(at.timestamp())
        .with_context(|| format!("timestamp {} is before the Unix epoch", at))
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie matching the session cookie's path, for use with `CookieJar::remove`.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
