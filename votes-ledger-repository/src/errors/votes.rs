//! Error types for the votes repository.
//! Defines specific errors that can occur during database operations on the ledger.
use thiserror::Error;

/// SQLSTATE codes reported when concurrent writers contend for the same rows.
const CONFLICT_SQLSTATES: [&str; 3] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
];

/// Represents errors that can occur within the votes repository.
#[derive(Debug, Error)]
pub enum VotesRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid vote direction in ledger: {0}")]
    InvalidDirection(i16),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Write conflict: {0}")]
    Conflict(String),
}

impl VotesRepositoryError {
    /// Whether the failure was caused by contention with a concurrent writer
    /// rather than by the store being unreachable or broken.
    pub fn is_conflict(&self) -> bool {
        match self {
            VotesRepositoryError::Conflict(_) => true,
            VotesRepositoryError::DatabaseError(sqlx::Error::Database(db)) => db
                .code()
                .is_some_and(|code| CONFLICT_SQLSTATES.contains(&code.as_ref())),
            _ => false,
        }
    }
}
