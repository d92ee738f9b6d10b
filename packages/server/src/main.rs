// Main entry point for the linkhold API server

mod app;
mod config;
mod routes;

use anyhow::{Context, Result};
use linkhold::{FetchConfig, HttpFetcher, PostgresStore};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,linkhold=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!("connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("running database migrations...");
    sqlx::migrate!("../linkhold/migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let fetcher = HttpFetcher::new(&FetchConfig {
        timeout: config.fetch_timeout,
        ..FetchConfig::default()
    })
    .context("failed to build fetch client")?;

    let app = app::build_app(PostgresStore::new(pool), fetcher);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind to address")?;

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
