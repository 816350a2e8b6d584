use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::DatabaseError;
use crate::users::{NewUser, RepositoryError, User, UserRepository};

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: HashMap<i32, User>,
}

/// Process-local `UserRepository`
///
/// Used for local development and the test suite. Email uniqueness and
/// atomic version bumps hold because every operation runs under one lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<Table>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, Table>, DatabaseError> {
        self.table
            .lock()
            .map_err(|_| DatabaseError::UnexpectedError("user table lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let table = self.table()?;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let table = self.table()?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.table()?;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            name: user.name,
            email: user.email,
            company: user.company,
            password_hash: user.password_hash,
            token_version: 0,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn bump_token_version(&self, id: i32) -> Result<Option<i32>, DatabaseError> {
        let mut table = self.table()?;
        Ok(table.rows.get_mut(&id).map(|user| {
            user.token_version += 1;
            user.token_version
        }))
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let table = self.table()?;
        let mut users: Vec<User> = table.rows.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            company: "Acme".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_zero_version() {
        let repo = InMemoryUserRepository::new();
        let first = repo.insert(new_user("a@example.com")).await.unwrap();
        let second = repo.insert(new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.token_version, 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_distinct_error() {
        let repo = InMemoryUserRepository::new();
        let original = repo.insert(new_user("a@example.com")).await.unwrap();

        let result = repo.insert(new_user("a@example.com")).await;
        assert!(matches!(result, Err(RepositoryError::DuplicateEmail)));

        let stored = repo.find_by_email("a@example.com").await.unwrap();
        assert_eq!(stored, Some(original));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bump_token_version() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("a@example.com")).await.unwrap();

        assert_eq!(repo.bump_token_version(user.id).await.unwrap(), Some(1));
        assert_eq!(repo.bump_token_version(user.id).await.unwrap(), Some(2));
        assert_eq!(repo.find_by_id(user.id).await.unwrap().unwrap().token_version, 2);
        assert_eq!(repo.bump_token_version(999).await.unwrap(), None);
    }
}
