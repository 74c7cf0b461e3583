//! Rollout controller daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                      ROLLOUT CONTROLLER                      │
//!     │                                                              │
//!     │   ┌──────────────┐   discover    ┌─────────────────────┐     │
//!     │   │ orchestrator │──────────────▶│  flag source client │◀────┼──── Flag API
//!     │   │   (ticks)    │               │  (features, report) │────▶│
//!     │   └──────┬───────┘               └──────────▲──────────┘     │
//!     │          │ per app                          │                │
//!     │          ▼                                  │ weight/report  │
//!     │   ┌──────────────┐                          │                │
//!     │   │ AppController│──────────────────────────┘                │
//!     │   │  + window    │                                           │
//!     │   └──────┬───────┘                                           │
//!     │          │ read stats / set weight                           │
//!     │          ▼                                                   │
//!     │   ┌──────────────┐                                           │
//!     │   │ HAProxy admin│───────────────────────────────────────────┼──── admin sockets
//!     │   └──────────────┘                                           │
//!     └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use rollout_controller::config::{load_config, load_from_env};
use rollout_controller::lifecycle::{bootstrap, Shutdown};
use rollout_controller::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rollout-controller")]
#[command(about = "Shift traffic between legacy and new pools from feature-flag weights", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("rollout-controller v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let orchestrator = match bootstrap(&config).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            std::process::exit(1);
        }
    };

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    orchestrator.run(stop).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
