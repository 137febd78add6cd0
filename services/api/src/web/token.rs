//! services/api/src/web/token.rs
//!
//! Signed session tokens for the auth cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use medreport_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Mints and verifies the signed, time-limited tokens carried in the auth
/// cookie. Tokens are self-contained; nothing is persisted server side, so a
/// token stays valid until expiry regardless of logout.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create a new issuer with the given HMAC secret and token lifetime.
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Lifetime of issued tokens in seconds, for the cookie Max-Age attribute.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Mint a token for the given user.
    pub fn issue(&self, user_id: Uuid) -> PortResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the user id the token was minted for.
    pub fn verify(&self, token: &str) -> PortResult<Uuid> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| PortError::Unauthorized)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| PortError::Unauthorized)
    }
}
