mod config;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use social_api::{AppStateInner, Logic};
use social_auth::{Hasher, TokenService};
use social_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social=debug,social_api=debug,social_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path, config.db_readers)?;

    let logic = Logic::new(
        Arc::new(db),
        Hasher::default(),
        TokenService::new(&config.jwt_secret),
    )?;

    let app = social_api::router(Arc::new(AppStateInner { logic }))
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Social server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Social server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
