use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Role, User};

pub const TOKEN_PREFIX: &str = "mock_";

/// Payload carried by a locally issued token. Unsigned: any holder can decode
/// or forge it. It marks a session, it does not authenticate one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub id: u64,
    pub username: String,
    pub role: Role,
    /// Expiry, epoch milliseconds
    pub exp: i64,
}

impl TokenClaims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp_millis()
    }
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    ttl: Duration,
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self { ttl: Duration::hours(24) }
    }
}

impl TokenIssuer {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn issue(&self, user: &User) -> String {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let claims = TokenClaims {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: (now + self.ttl).timestamp_millis(),
        };
        // Serializing a plain struct of strings/ints cannot fail
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        format!("{}{}", TOKEN_PREFIX, STANDARD.encode(json))
    }
}

/// Decode a locally issued token. Remote tokens use their own format and
/// yield `None`.
pub fn decode(token: &str) -> Option<TokenClaims> {
    let body = token.strip_prefix(TOKEN_PREFIX)?;
    let bytes = STANDARD.decode(body).ok()?;
    serde_json::from_slice(&bytes).ok()
}
