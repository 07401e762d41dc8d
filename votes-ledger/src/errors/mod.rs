//! Error types for the votes ledger service.
//! Consolidates configuration, connection and store errors raised while the
//! service starts up.
use votes_ledger_repository::VotesRepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] VotesRepositoryError),
}

impl LedgerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
