use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthFlow, RefreshCookie, TokenCodec};
use crate::configuration::{Settings, StorageBackend};
use crate::error::AppError;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    current_user, health_check, list_users, login, logout, refresh_token, register, revoke,
};
use crate::users::{InMemoryUserRepository, PgUserRepository, UserRepository};

/// Open the configured user store, running migrations for Postgres
pub async fn build_repository(settings: &Settings) -> Result<Arc<dyn UserRepository>, AppError> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory user store; users are lost on restart");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
        StorageBackend::Postgres => {
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&settings.database.connection_string())
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database connection pool created and migrated");

            Ok(Arc::new(PgUserRepository::new(pool)))
        }
    }
}

/// Wire the auth flow and its cookie settings from configuration
pub fn build_flow(
    settings: &Settings,
    repo: Arc<dyn UserRepository>,
) -> Result<(AuthFlow, RefreshCookie), AppError> {
    let codec = TokenCodec::new(&settings.jwt);
    let refresh_cookie = RefreshCookie::new(&settings.auth, codec.refresh_token_expiry());
    let flow = AuthFlow::new(repo, codec, &settings.auth)?;
    Ok((flow, refresh_cookie))
}

pub fn run(
    listener: TcpListener,
    flow: AuthFlow,
    refresh_cookie: RefreshCookie,
) -> Result<Server, std::io::Error> {
    let codec = flow.codec().clone();
    let flow = web::Data::new(flow);
    let refresh_cookie = web::Data::new(refresh_cookie);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(flow.clone())
            .app_data(refresh_cookie.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/me", web::get().to(current_user))
            .route("/auth/logout", web::post().to(logout))
            .route("/refresh_token", web::post().to(refresh_token))
            // Protected routes (require a valid access token)
            .service(
                web::resource("/auth/revoke")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route(web::post().to(revoke)),
            )
            .service(
                web::resource("/users")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route(web::get().to(list_users)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
