mod auth;
mod health_check;
mod users;

pub use auth::{current_user, login, logout, refresh_token, register, revoke};
pub use health_check::health_check;
pub use users::list_users;
