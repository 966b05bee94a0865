use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{initialize_app_state, Settings};
use crate::router::create_router;

/// Migrates the database and serves the API until the listener fails.
pub async fn serve(settings: Settings, bind_address: &str) -> Result<()> {
    info!(
        "Starting cheflab with report rounding '{}'",
        settings.report_rounding
    );

    let state = initialize_app_state(&settings).await.map_err(|e| {
        error!("Failed to initialize application state: {:#}", e);
        e
    })?;

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", bind_address))?;

    info!("Cheflab API listening on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    axum::serve(listener, create_router(state))
        .await
        .context("server error")?;

    Ok(())
}
