//! gatehouse server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), applies
//! `GATEHOUSE_*` environment overrides, opens the SQLite user store, and
//! serves the identity API over HTTP until interrupted.

use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gatehouse identity server")]
struct Cli {
  /// Path to the TOML configuration file. Missing files are ignored.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = gatehouse_server::load_config(&cli.config)?;

  gatehouse_server::run(config).await
}
