/// JWT Token Generation and Validation
///
/// `TokenCodec` issues and verifies the access/refresh pair. Each kind has
/// its own secret, so a leaked access token cannot be replayed as a refresh
/// token or the other way round.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::users::User;

#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        // Expiry is exact; the configured lifetimes are the only slack.
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
            validation,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    /// Issue an access token encoding `{userId}`
    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let claims = AccessClaims::new(user.id, self.access_token_expiry, &self.issuer);
        self.sign(&claims, &self.access_encoding)
    }

    /// Issue a refresh token encoding `{userId, tokenVersion}`
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AppError> {
        let claims = RefreshClaims::new(
            user.id,
            user.token_version,
            self.refresh_token_expiry,
            &self.issuer,
        );
        self.sign(&claims, &self.refresh_encoding)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token, &self.access_decoding)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token, &self.refresh_decoding)
    }

    /// Verify signature, expiry and issuer, returning the decoded claims
    ///
    /// Every failure collapses into `AuthError::TokenInvalid`; callers treat
    /// it as "not authorized" rather than as a fatal error.
    pub fn verify<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, AuthError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                AuthError::TokenInvalid
            })
    }

    fn sign<T: Serialize>(&self, claims: &T, key: &EncodingKey) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
