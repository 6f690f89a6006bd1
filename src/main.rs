use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use caixa_api::config::{self, StoreBackend};
use caixa_api::database::DatabaseManager;
use caixa_api::services::{bootstrap, SeedUser};
use caixa_api::store::{MemoryRecordStore, PgRecordStore, RecordStore};
use caixa_api::{app, AppState};

#[derive(Parser)]
#[command(name = "caixa-api")]
#[command(about = "Multi-tenant personal finance ledger API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides CAIXA_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, value_parser = ["memory", "postgres"], help = "Record store backend (overrides STORE_BACKEND)")]
    store: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut cfg = config::config().clone();
    if let Some(port) = args.port {
        cfg.app.port = port;
    }
    if let Some(store) = args.store.as_deref() {
        cfg.store.backend = match store {
            "postgres" => StoreBackend::Postgres,
            _ => StoreBackend::Memory,
        };
    }
    if caixa_api::is_development!() {
        tracing::warn!("Development mode: built-in session secret and in-memory defaults");
    }
    if cfg.session.jwt_secret.is_empty() {
        anyhow::bail!("SESSION_JWT_SECRET must be set outside development");
    }
    tracing::info!("Starting {} in {:?} mode ({:?} store)", cfg.app.name, cfg.environment, cfg.store.backend);

    let store: Arc<dyn RecordStore> = match cfg.store.backend {
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
        StoreBackend::Postgres => Arc::new(PgRecordStore::connect().await.context("connecting record store")?),
    };
    bootstrap(store.as_ref(), &cfg.store, SeedUser::from_env().as_ref())
        .await
        .context("preparing registry tables")?;

    let app = app(AppState::build(&cfg, store));

    let bind_addr = format!("0.0.0.0:{}", cfg.app.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;

    DatabaseManager::close_all().await;
    Ok(())
}
