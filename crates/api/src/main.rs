//! Atrium API server entry point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atrium_api::{routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,atrium_api=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool =
        atrium_shared::db::create_pool(&config.database_url, config.database_max_connections)
            .await?;
    atrium_shared::db::run_migrations(&pool).await?;

    let state = AppState::new(pool, Arc::new(config));
    let router = routes::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address).await?;
    tracing::info!(address = %state.config.bind_address, "Atrium API listening");

    axum::serve(listener, router).await?;

    Ok(())
}
