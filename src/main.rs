use anyhow::Result;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::inference::load_model;
use crate::routes::{router, AppState};
use crate::telemetry::init_telemetry;

mod config;
mod error;
mod inference;
mod routes;
mod telemetry;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_CONFIG_FILE: &str = "ModelEndpoint.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = Config::load(&args.config_file, args.config_file == DEFAULT_CONFIG_FILE)?;
    let config_missing = loaded.is_none();
    let config = loaded.unwrap_or_default().merge(args.opt_config);

    init_telemetry(config.otel_endpoint(), config.console)?;
    if config_missing {
        info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
    }

    let model = match load_model(&config) {
        Ok(model) => model,
        Err(err) => exit_err!(1, "Failed to load {:?} model: {:#}", config.model, err),
    };
    let app = router(AppState { model }, config.body_limit);

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[macro_export]
macro_rules! exit_err {
    ($code:expr, $fmt:expr $(, $arg:expr)*) => {
        {
            error!($fmt $(, $arg)*);
            std::process::exit($code);
        }
    };
}
