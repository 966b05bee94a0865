use anyhow::{Context, Result};
use compute::RoundingPolicy;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, info, trace};

use crate::auth::TokenIssuer;
use crate::schemas::AppState;

/// Settings the server is started with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub report_rounding: RoundingPolicy,
}

/// Connects to the database and applies pending migrations.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection> {
    trace!("Connecting to database");
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("failed to connect to database '{}'", database_url))?;
    debug!("Database connection established");

    info!("Running database migrations");
    Migrator::up(&db, None)
        .await
        .context("failed to run database migrations")?;
    info!("Database migrations completed successfully");

    Ok(db)
}

/// Initialize application state from the server settings
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    let db = connect_and_migrate(&settings.database_url).await?;

    debug!(
        "Tokens valid for {} hours, report rounding: {}",
        settings.token_ttl_hours, settings.report_rounding
    );

    Ok(AppState {
        db,
        tokens: TokenIssuer::new(&settings.jwt_secret, settings.token_ttl_hours),
        report_rounding: settings.report_rounding,
    })
}
