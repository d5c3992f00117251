//! Process wiring for the Gatehouse server.
//!
//! Loads [`ServerConfig`], opens the SQLite store, mounts the API behind CORS
//! and request tracing, and closes the store after a graceful shutdown.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use gatehouse_api::Environment;
use gatehouse_core::store::UserStore;
use gatehouse_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::{net::TcpListener, signal};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

/// Prefix for environment-variable overrides, e.g. `GATEHOUSE_PORT=8080`.
pub const ENV_PREFIX: &str = "GATEHOUSE";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  pub environment: Environment,
}

/// Layer built-in defaults, the optional TOML file at `path`, and
/// `GATEHOUSE_*` environment variables, in increasing precedence.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 5000)?
    .set_default("store_path", "gatehouse.db")?
    .set_default("environment", "production")?
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix(ENV_PREFIX))
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router with CORS (any origin) and per-request tracing.
pub fn app<S>(store: Arc<S>, environment: Environment) -> Router
where
  S: UserStore + 'static,
{
  gatehouse_api::api_router(store, environment)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
}

/// Open the store, serve until SIGINT/SIGTERM, then close the store.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
  let store_path = expand_tilde(&config.store_path);
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", config.host, config.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!(environment = ?config.environment, "Listening on http://{address}");
  axum::serve(listener, app(Arc::new(store.clone()), config.environment))
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  store.close().await.context("failed to close store")?;
  tracing::info!("shutdown complete");
  Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}

/// Resolve a store path whose first component is `~` against `$HOME`.
/// Paths without that component, or with `HOME` unset, pass through.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(relative), Some(home)) => Path::new(&home).join(relative),
    _ => path.to_path_buf(),
  }
}
