use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::WrapErr;
use tracing::info;

mod api;
mod config;
mod openapi;
mod server;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics().wrap_err("Failed to install Prometheus recorder")?;

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .wrap_err("PostgreSQL connection failed")?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .wrap_err("Database migrations failed")?;
    }

    let state = AppState { config, db };

    let app = server::build_router(api::routes(&state).merge(api::system_router(state.clone())));

    info!(
        name = state.config.app.name,
        version = state.config.app.version,
        environment = state.config.environment.as_str(),
        "Starting analytics API"
    );

    let server_config = state.config.server.clone();
    server::serve(app, &server_config, async move {
        info!("Shutting down: closing database connections");
        match state.db.close().await {
            Ok(_) => info!("PostgreSQL connection closed"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    })
    .await
    .wrap_err("Server error")?;

    info!("Analytics API shutdown complete");
    Ok(())
}
