//! # QC Deploy
//!
//! Deploys the registry, limiter and token ledger in dependency order and
//! wires their permissions.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags
//! 2. Initialize logging (`RUST_LOG`, default `info`)
//! 3. Load configuration (file, environment, flags)
//! 4. Build or load the plan
//! 5. Run and print the summary

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qc_deploy_runtime::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match qc_deploy_runtime::run(&args).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
