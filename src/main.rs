#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
mod arg_parse;
mod common;
mod config;
mod dispatch;
mod feeds;
mod sender;
mod storage;
mod tradingeconomics;

use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{arg_parse::CmdArgs, common::prelude::*, config::AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CmdArgs::parse(std::env::args().collect())?;
    let config = load_config(&args)?;

    if args.run_loop {
        let interval = config.loop_interval();
        info!(interval_secs = interval.as_secs(), "running in a loop (Ctrl+C to stop)");
        loop {
            // a failed cycle is retried on the next tick
            if let Err(e) = dispatch::run(&config).await {
                error!(error = %e, "cycle skipped");
            }
            tokio::time::sleep(interval).await;
        }
    }

    if let Err(e) = dispatch::run(&config).await {
        error!(error = %e, "cycle skipped");
        return Err(e.into());
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Defaults, then the optional config file, then the environment, then
/// command line flags.
fn load_config(args: &CmdArgs) -> Result<AppConfig, NotifierError> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let mut config = config.with_env(|key| std::env::var(key).ok());
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }

    Ok(config)
}
