/// Authentication flow
///
/// Orchestrates register, login, current user, refresh, logout and revoke
/// on top of the token codec, the password hasher and the user store.
///
/// Every operation returns `Result<AuthOutcome<T>, AppError>`. The outer
/// `Err` is reserved for failures the server cannot recover from (storage
/// down, token signing failure). Expected outcomes such as a wrong password
/// or a stale refresh cookie are an `AuthFailure` inside the outcome.

use std::fmt;
use std::sync::Arc;

use crate::auth::cookie::CookieInstruction;
use crate::auth::jwt::TokenCodec;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::revocation;
use crate::configuration::{AuthSettings, LogoutPolicy};
use crate::error::{AppError, ValidationError};
use crate::users::{NewUser, RepositoryError, UserProfile, UserRepository};
use crate::validators::{is_valid_company, is_valid_email, is_valid_name};

/// Expected, user-facing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    DuplicateUser,
    NotAuthorized,
    RefreshDenied,
    Invalid(ValidationError),
}

impl AuthFailure {
    /// Input field the failure refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AuthFailure::DuplicateUser => Some("email"),
            AuthFailure::Invalid(e) => Some(e.field()),
            _ => None,
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::InvalidCredentials => write!(f, "Username or password invalid"),
            AuthFailure::DuplicateUser => write!(f, "username already taken"),
            AuthFailure::NotAuthorized => write!(f, "Not Authorized"),
            AuthFailure::RefreshDenied => write!(f, "Refresh denied"),
            AuthFailure::Invalid(e) => write!(f, "{}", e),
        }
    }
}

/// Result of one flow operation plus what to do with the refresh cookie
#[derive(Debug)]
pub struct AuthOutcome<T> {
    pub result: Result<T, AuthFailure>,
    pub cookie: Option<CookieInstruction>,
}

impl<T> AuthOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self { result: Ok(value), cookie: None }
    }

    pub fn failed(failure: AuthFailure) -> Self {
        tracing::debug!(failure = ?failure, "Authentication request rejected");
        Self { result: Err(failure), cookie: None }
    }

    pub fn with_cookie(mut self, cookie: CookieInstruction) -> Self {
        self.cookie = Some(cookie);
        self
    }
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginPayload {
    pub user: UserProfile,
    pub access_token: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Password checked on the unknown-email path of `login`
const DUMMY_PASSWORD: &str = "jid-auth-dummy-password";

#[derive(Clone)]
pub struct AuthFlow {
    repo: Arc<dyn UserRepository>,
    codec: TokenCodec,
    bcrypt_cost: u32,
    logout_policy: LogoutPolicy,
    // Same cost as stored hashes, so a miss costs as much as a wrong password.
    dummy_hash: String,
}

impl AuthFlow {
    /// Build the flow, hashing a dummy password at the configured cost.
    ///
    /// # Errors
    /// Fails if bcrypt rejects `settings.bcrypt_cost`.
    pub fn new(
        repo: Arc<dyn UserRepository>,
        codec: TokenCodec,
        settings: &AuthSettings,
    ) -> Result<Self, AppError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, settings.bcrypt_cost)?;

        Ok(Self {
            repo,
            codec,
            bcrypt_cost: settings.bcrypt_cost,
            logout_policy: settings.logout_policy,
            dummy_hash,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a user. Does not log the new user in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        company: &str,
        password: &str,
    ) -> Result<AuthOutcome<UserProfile>, AppError> {
        let new_user = match validate_registration(name, email, company, password) {
            Ok(fields) => fields,
            Err(e) => return Ok(AuthOutcome::failed(AuthFailure::Invalid(e))),
        };

        let password_hash = hash_password(password, self.bcrypt_cost)?;
        let new_user = NewUser { password_hash, ..new_user };

        match self.repo.insert(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User registered");
                Ok(AuthOutcome::ok(user.profile()))
            }
            Err(RepositoryError::DuplicateEmail) => {
                Ok(AuthOutcome::failed(AuthFailure::DuplicateUser))
            }
            Err(RepositoryError::Database(e)) => Err(e.into()),
        }
    }

    /// Check credentials and issue a token pair
    ///
    /// An unknown email and a wrong password produce the same failure.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome<LoginPayload>, AppError> {
        let email = match is_valid_email(email) {
            Ok(email) => email,
            Err(_) => return Ok(AuthOutcome::failed(AuthFailure::InvalidCredentials)),
        };

        let user = match self.repo.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                verify_password(password, &self.dummy_hash);
                return Ok(AuthOutcome::failed(AuthFailure::InvalidCredentials));
            }
        };

        if !verify_password(password, &user.password_hash) {
            return Ok(AuthOutcome::failed(AuthFailure::InvalidCredentials));
        }

        let refresh_token = self.codec.issue_refresh_token(&user)?;
        let access_token = self.codec.issue_access_token(&user)?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(AuthOutcome::ok(LoginPayload {
            user: user.profile(),
            access_token,
        })
        .with_cookie(CookieInstruction::Set(refresh_token)))
    }

    /// Resolve the user behind an `Authorization` header value
    pub async fn current_user(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthOutcome<UserProfile>, AppError> {
        let claims = match authorization
            .and_then(bearer_token)
            .map(|token| self.codec.verify_access_token(token))
        {
            Some(Ok(claims)) => claims,
            _ => return Ok(AuthOutcome::failed(AuthFailure::NotAuthorized)),
        };

        match self.repo.find_by_id(claims.user_id).await? {
            Some(user) => Ok(AuthOutcome::ok(user.profile())),
            None => Ok(AuthOutcome::failed(AuthFailure::NotAuthorized)),
        }
    }

    /// Exchange a refresh cookie for a new access token and a new cookie
    ///
    /// Fails closed without saying why: missing cookie, bad signature,
    /// expiry, unknown user and revoked version all yield `RefreshDenied`.
    pub async fn refresh(
        &self,
        refresh_cookie: Option<&str>,
    ) -> Result<AuthOutcome<String>, AppError> {
        let token = match refresh_cookie {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(AuthOutcome::failed(AuthFailure::RefreshDenied)),
        };

        let claims = match self.codec.verify_refresh_token(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(AuthOutcome::failed(AuthFailure::RefreshDenied)),
        };

        let user = match self.repo.find_by_id(claims.user_id).await? {
            Some(user) => user,
            None => return Ok(AuthOutcome::failed(AuthFailure::RefreshDenied)),
        };

        if !revocation::is_current(&claims, &user) {
            tracing::debug!(user_id = user.id, "Refresh token version is stale");
            return Ok(AuthOutcome::failed(AuthFailure::RefreshDenied));
        }

        let refresh_token = self.codec.issue_refresh_token(&user)?;
        let access_token = self.codec.issue_access_token(&user)?;

        tracing::debug!(user_id = user.id, "Token pair rotated");

        Ok(AuthOutcome::ok(access_token).with_cookie(CookieInstruction::Set(refresh_token)))
    }

    /// Clear the refresh cookie, and under `LogoutPolicy::RevokeAll` also
    /// revoke every refresh token of the cookie's owner.
    pub async fn logout(&self, refresh_cookie: Option<&str>) -> Result<AuthOutcome<()>, AppError> {
        if self.logout_policy == LogoutPolicy::RevokeAll {
            let claims = refresh_cookie
                .filter(|token| !token.is_empty())
                .and_then(|token| self.codec.verify_refresh_token(token).ok());

            if let Some(claims) = claims {
                if let Some(user) = self.repo.find_by_id(claims.user_id).await? {
                    if revocation::is_current(&claims, &user) {
                        revocation::bump(self.repo.as_ref(), user.id).await?;
                    }
                }
            }
        }

        Ok(AuthOutcome::ok(()).with_cookie(CookieInstruction::Clear))
    }

    /// Invalidate all refresh tokens of `user_id`, returning the new version
    pub async fn revoke(&self, user_id: i32) -> Result<i32, AppError> {
        revocation::bump(self.repo.as_ref(), user_id).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let users = self.repo.list().await?;
        Ok(users.iter().map(|user| user.profile()).collect())
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    company: &str,
    password: &str,
) -> Result<NewUser, ValidationError> {
    let name = is_valid_name(name)?;
    let email = is_valid_email(email)?;
    let company = is_valid_company(company)?;
    validate_password(password)?;

    Ok(NewUser {
        name,
        email,
        company,
        password_hash: String::new(),
    })
}
