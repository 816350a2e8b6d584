use async_trait::async_trait;
use std::fmt;

use crate::error::DatabaseError;
use crate::users::{NewUser, User};

/// Failure of `UserRepository::insert`
#[derive(Debug)]
pub enum RepositoryError {
    /// The email is already registered
    DuplicateEmail,
    /// Any other storage failure; fatal for the current request
    Database(DatabaseError),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::DuplicateEmail => write!(f, "email already registered"),
            RepositoryError::Database(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match DatabaseError::from(err) {
            DatabaseError::UniqueConstraintViolation(_) => RepositoryError::DuplicateEmail,
            other => RepositoryError::Database(other),
        }
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        RepositoryError::Database(err)
    }
}

/// Persistence operations used by the auth flow
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// At most one user has a given email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError>;

    /// Insert a user, failing with `DuplicateEmail` on a unique-key conflict.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Atomically increment the user's token version and return the new
    /// value, or `None` if the user does not exist.
    async fn bump_token_version(&self, id: i32) -> Result<Option<i32>, DatabaseError>;

    async fn list(&self) -> Result<Vec<User>, DatabaseError>;
}
