//! Votes Ledger Main Entry Point
//!
//! Connects to PostgreSQL, makes sure the ledger schema exists and reports
//! readiness.

use dotenv::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use votes_ledger::{Dependencies, LedgerConfig, LedgerError};

/// Initialize tracing/logging.
///
/// `LOG_FORMAT=json` selects structured JSON output, anything else the
/// pretty console output.
fn init_tracing() -> Result<(), LedgerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("votes_ledger=info,votes_ledger_core=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| LedgerError::config(format!("Failed to initialize tracing: {e}")))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| LedgerError::config(format!("Failed to initialize tracing: {e}")))?;
    }

    info!(
        service_name = "votes-ledger",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), LedgerError> {
    dotenv().ok();

    init_tracing()?;

    info!("Starting votes ledger");

    let config = LedgerConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    info!(
        pool_size = deps.repository.pool_size(),
        max_batch_size = ?config.max_batch_size,
        "Votes ledger ready"
    );

    Ok(())
}
