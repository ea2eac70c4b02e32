//! hazard-csv: wind hazard lookups for a table of locations.
//!
//! Reads locations from a CSV file or coordinate lists, queries the remote
//! hazard service in parallel batches, optionally expands or regrids each
//! point's neighborhood, and writes one CSV table to a file or stdout.
//!
//! Logs go to stderr as JSON so stdout can carry the table.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use hazard_cli::{exit_code, run, Args};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {}", e);
    }

    match run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            error!(error = %format!("{:#}", e), exit_code = code, "hazard-csv failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(code)
        }
    }
}
