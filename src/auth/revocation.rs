/// Refresh token revocation
///
/// The per-user `token_version` counter lives on the user record. A refresh
/// token is only honoured while the version it carries equals the current
/// one, so bumping the counter revokes every refresh token issued before.

use crate::auth::claims::RefreshClaims;
use crate::error::{AppError, DatabaseError};
use crate::users::{User, UserRepository};

pub fn current_version(user: &User) -> i32 {
    user.token_version
}

/// Whether a refresh token's captured version is still current for `user`
pub fn is_current(claims: &RefreshClaims, user: &User) -> bool {
    claims.user_id == user.id && claims.token_version == current_version(user)
}

/// Increment the user's token version, returning the new value
///
/// # Errors
/// `NotFound` if the user does not exist, or any storage failure.
pub async fn bump(repo: &dyn UserRepository, user_id: i32) -> Result<i32, AppError> {
    let version = repo.bump_token_version(user_id).await?.ok_or_else(|| {
        AppError::Database(DatabaseError::NotFound(format!("user {}", user_id)))
    })?;

    tracing::info!(user_id = user_id, token_version = version, "Refresh tokens revoked");
    Ok(version)
}
