/// JWT Claims structures
///
/// Access tokens carry only the user id. Refresh tokens additionally carry
/// the user's token version at the time of issue.

use serde::{Deserialize, Serialize};

/// Claims of a short-lived access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: i32,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

/// Claims of a refresh token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: i32,
    /// Must equal the user's current token version for the token to be usable
    pub token_version: i32,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl AccessClaims {
    pub fn new(user_id: i32, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }
}

impl RefreshClaims {
    pub fn new(user_id: i32, token_version: i32, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id,
            token_version,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }
}
