//! # rusty-forum
//!
//! Reads configuration, picks the store (in-memory or Postgres), wires the
//! services, the JWT verifier and the renderer into the router, and serves
//! until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, SafeHtmlRenderer};
use auth_adapters::JwtAuthenticator;
use configs::{DatabaseSettings, LoggingSettings, Settings};
use services::{ForumServices, Repositories};
use storage_adapters::InMemoryStore;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn repositories(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    if database.is_memory() {
        tracing::warn!("using the in-memory store, all data is lost on exit");
        return Ok(Repositories::from_store(Arc::new(InMemoryStore::new())));
    }
    postgres(database).await
}

#[cfg(feature = "db-postgres")]
async fn postgres(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    use secrecy::ExposeSecret;

    let store = storage_adapters::PgStore::connect(
        database.url.expose_secret(),
        database.max_connections,
    )
    .await?;
    if database.run_migrations {
        store.migrate().await?;
        tracing::info!("migrations applied");
    }
    Ok(Repositories::from_store(Arc::new(store)))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres(_: &DatabaseSettings) -> anyhow::Result<Repositories> {
    anyhow::bail!("database.url names a server but this build has no Postgres support")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.logging);

    if settings.auth.uses_dev_secret() {
        tracing::warn!("auth.jwt_secret is the development default, set FORUM__AUTH__JWT_SECRET");
    }

    let repos = repositories(&settings.database).await?;
    let auth = JwtAuthenticator::new(
        &settings.auth.jwt_secret,
        chrono::Duration::seconds(settings.auth.token_ttl_secs),
    );
    let state = AppState::new(
        ForumServices::new(repos),
        Arc::new(auth),
        Arc::new(SafeHtmlRenderer),
    );

    let address = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(%address, "rusty-forum listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
