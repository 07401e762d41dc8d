//! Dependency initialization and wiring for the votes ledger service.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use votes_ledger_core::{TracingSink, VoteLedger, VotesConfig};
use votes_ledger_repository::{PostgresVotesRepository, VotesRepository};

use crate::config::{ConnectionMode, LedgerConfig};
use crate::errors::LedgerError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The PostgreSQL store, schema already in place.
    pub repository: Arc<PostgresVotesRepository>,
    votes_config: VotesConfig,
}

impl Dependencies {
    /// Connects to PostgreSQL, ensures the ledger schema and wires the ledger.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(LedgerError)` - If the migrations fail or the connection fails
    ///   in fail-fast mode
    pub async fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        info!(
            max_connections = config.max_connections,
            max_batch_size = ?config.max_batch_size,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let pool = Self::connect_to_postgres(config).await?;
        info!("PostgreSQL connection established");

        let repository = PostgresVotesRepository::new(pool).await?;
        repository.ensure_schema().await?;

        Ok(Self::from_parts(Arc::new(repository), config.votes_config()))
    }

    fn from_parts(repository: Arc<PostgresVotesRepository>, votes_config: VotesConfig) -> Self {
        Self {
            repository,
            votes_config,
        }
    }

    /// Builds a ledger over the shared PostgreSQL store.
    ///
    /// Every ledger returned shares the same pool and logs its events through
    /// `TracingSink`.
    pub fn ledger(&self) -> VoteLedger {
        VoteLedger::new(self.repository.clone(), Arc::new(TracingSink), self.votes_config.clone())
    }

    /// Connect to PostgreSQL with retry logic based on connection mode.
    async fn connect_to_postgres(config: &LedgerConfig) -> Result<PgPool, LedgerError> {
        loop {
            match Self::try_connect(&config.database_url, config.max_connections).await {
                Ok(pool) => return Ok(pool),
                Err(e) => match config.connection_mode {
                    ConnectionMode::FailFast => return Err(LedgerError::Database(e)),
                    ConnectionMode::Retry => {
                        warn!(
                            error = %e,
                            retry_interval_secs = config.retry_interval.as_secs(),
                            "Failed to connect to PostgreSQL, retrying..."
                        );
                        sleep(config.retry_interval).await;
                    }
                },
            }
        }
    }

    async fn try_connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
    }
}
