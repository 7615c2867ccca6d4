mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use torrent_remote::core::tracing_init::init_tracing;
use tracing::debug;

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = cli::load_config(&cli)?;

    // Initialize tracing/logging
    init_tracing(&config.logging);

    debug!(
        config_path = %cli.config.display(),
        api_url = %config.api.base_url,
        poll_interval_ms = config.polling.interval_ms,
        "torrent-remote starting"
    );

    // One thread is enough: all work is waiting on the network
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(cli::run(cli, config))
}
