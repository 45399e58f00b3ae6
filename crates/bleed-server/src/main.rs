//! Service binary for the Bleed propagation engine.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$BLEED_CONFIG` (default
//!    `bleed-config.yaml`), falling back to defaults when the file is
//!    absent; environment overrides apply either way
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured store; for `PostgreSQL`, run migrations
//! 4. Serve the echo API until `Ctrl-C`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bleed_api::AppState;
use bleed_core::config::LoggingConfig;
use bleed_core::{InMemoryStore, ServiceConfig, Store, StoreBackend};
use bleed_db::{PgStore, PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Config file used when `BLEED_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "bleed-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = |key: &str| std::env::var(key).ok();
    let path = config_path(env);
    let config = load_config(&path, env).with_context(|| format!("loading {}", path.display()))?;

    init_tracing(&config.logging);
    info!(
        config = %path.display(),
        backend = ?config.store.backend,
        port = config.server.port,
        auth = config.api.auth_token.is_some(),
        "bleed-server starting"
    );

    let store = open_store(&config).await?;
    let state = Arc::new(AppState::new(store, config.api.clone()));

    bleed_api::start_server(&config.server, state)
        .await
        .context("echo API server failed")?;

    info!("bleed-server stopped");
    Ok(())
}

fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("BLEED_CONFIG")
        .filter(|p| !p.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

fn load_config<F>(path: &Path, lookup: F) -> Result<ServiceConfig, bleed_core::ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if path.exists() {
        return ServiceConfig::from_file(path, lookup);
    }
    let mut config = ServiceConfig::default();
    config.apply_env_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; state is lost on restart");
            let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
            Ok(store)
        }
        StoreBackend::Postgres => {
            let pool = PostgresPool::connect(&PostgresConfig::from_store_config(&config.store))
                .await
                .context("connecting to PostgreSQL")?;
            pool.run_migrations()
                .await
                .context("running migrations")?;
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            Ok(store)
        }
    }
}
