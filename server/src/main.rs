use server::core::{AppState, Config, StorageBackend};
use server::create_router;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    config.print_info();

    let state = match (config.storage_backend, &config.database_url) {
        (StorageBackend::MySql, Some(database_url)) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database connected and migrated");
            AppState::new(
                pool,
                config.jwt_secret.clone(),
                config.translator(),
                config.gateway_options(),
            )
        }
        _ => AppState::in_memory(
            config.jwt_secret.clone(),
            config.translator(),
            config.gateway_options(),
        ),
    };

    let app = create_router(Arc::new(state)).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
