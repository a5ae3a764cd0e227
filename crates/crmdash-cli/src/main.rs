//! crmdash - command-line front end for the CRM dashboard session.
//!
//! Logs in against the CRM API, keeps the session token between runs and
//! checks dashboard routes against the session before "opening" them.

mod commands;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Directory for the optional rolling log file
const LOG_DIR_ENV: &str = "CRMDASH_LOG_DIR";

const LOG_FILE_NAME: &str = "crmdash.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer when dropped.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", commands::USAGE);
            std::process::exit(2);
        }
    };

    info!(?command, "crmdash starting");
    commands::run(command).await
}
