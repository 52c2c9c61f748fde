//! hoardd: the hoard daemon.
//!
//! Installs and activates the configured cache generation, then serves the
//! origin through the [`CacheWorker`](hoard::CacheWorker) as an HTTP proxy.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use reqwest::Url;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hoard::server::{Config, ProxyState};
use hoard::{CacheWorker, HoardError};

/// Hoard daemon: offline-capable caching proxy.
#[derive(Parser)]
#[command(name = "hoardd")]
#[command(version = hoard::PKG_VERSION)]
#[command(about = "Hoard caching proxy daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HOARD_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Run install once, print the outcome as JSON and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let cache = Arc::new(config.builder().build()?);

    info!(
        version = hoard::version_string(),
        generation = %cache.lifecycle().generation_name(),
        "hoardd starting"
    );

    // A failed install is a failed rollout
    let outcome = match cache.on_install().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "install failed");
            return Err(e.into());
        }
    };

    if args.check {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.skip_waiting() {
        let report = cache.on_activate().await?;
        info!(current = %report.current, deleted = report.deleted.len(), "activated");
    }

    let _expiry = cache.spawn_expiry();

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| HoardError::Configuration(format!("Invalid address: {e}")))?;
    let origin = Url::parse(&config.origin.base_url)
        .map_err(|e| HoardError::Configuration(format!("Invalid origin: {e}")))?;

    let worker: Arc<dyn CacheWorker> = cache;
    hoard::server::serve(addr, ProxyState::new(worker, origin)).await?;

    Ok(())
}
