use serde::Serialize;

/// A stored user
///
/// `password_hash` and `token_version` never leave the server; responses
/// use `UserProfile` instead.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub company: String,
    pub password_hash: String,
    pub token_version: i32,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
        }
    }
}

/// Fields required to insert a user. The store assigns `id` and starts
/// `token_version` at 0.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub company: String,
    pub password_hash: String,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub company: String,
}
