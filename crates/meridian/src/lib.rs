//! # Meridian World Server - Main Entry Point
//!
//! Boots the authoritative world simulation: parses the command line, loads
//! the TOML configuration, initializes logging, builds the world from a level
//! description and runs the fixed-rate tick loop until a termination signal.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (creates config.toml if missing)
//! meridian
//!
//! # Load a level and its nav grid
//! meridian --level levels/forest.json --navgrid levels/forest.nav.json
//!
//! # Override specific settings
//! meridian --config production.toml --tick-interval 50 --log-level debug
//!
//! # JSON logging for production
//! meridian --json-logs
//! ```
//!
//! ## Signal Handling
//!
//! The first SIGINT/SIGTERM stops the tick loop and drains the notification
//! queues; a second one exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;
mod sink;

use app::Application;
use cli::CliArgs;

/// Runs the server to completion.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings are needed before the full configuration is validated
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    let mut logging = config.logging;
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use app::build_world;
pub use config::{AppConfig, LoggingSettings, ServerSettings};
pub use sink::LoggingSink;
