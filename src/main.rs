use atrium::api::ApiClient;
use atrium::cli::Args;
use atrium::commands;
use atrium::config::Config;
use atrium::logging::setup_logging;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and set up logging before anything else so startup
    // diagnostics are never silently dropped.
    let config = Config::load().expect("Failed to load configuration");
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        base_url = %config.base_url,
        "starting atrium console"
    );

    let api = match ApiClient::new(&config) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to initialize API client");
            return ExitCode::FAILURE;
        }
    };

    match commands::run(args, api).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}
