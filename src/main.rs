use std::net::TcpListener;

use jid_auth::configuration::get_configuration;
use jid_auth::startup::{build_flow, build_repository, run};
use jid_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(
                storage = ?config.storage.backend,
                logout_policy = ?config.auth.logout_policy,
                "Configuration loaded successfully"
            );
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let repository = build_repository(&configuration).await.map_err(|e| {
        tracing::error!("Failed to open user store: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "User store error")
    })?;

    let (flow, refresh_cookie) = build_flow(&configuration, repository).map_err(|e| {
        tracing::error!("Failed to set up authentication: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Authentication setup error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, flow, refresh_cookie)?.await
}
