/// User storage
///
/// The `User` record and the `UserRepository` seam the auth flow talks to,
/// with a Postgres implementation and an in-memory one.

mod memory;
mod model;
mod postgres;
mod repository;

pub use memory::InMemoryUserRepository;
pub use model::{NewUser, User, UserProfile};
pub use postgres::PgUserRepository;
pub use repository::{RepositoryError, UserRepository};
