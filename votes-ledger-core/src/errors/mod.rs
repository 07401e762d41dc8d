//! Error types for the votes ledger core.
//! Every ledger operation reports a `VotesError`; store failures are passed
//! through unmodified and never retried here.
use thiserror::Error;
use votes_ledger_repository::VotesRepositoryError;
use votes_ledger_shared::errors::InvalidDirection;

/// Represents errors that can occur while reading or mutating the ledger.
#[derive(Debug, Error)]
pub enum VotesError {
    /// The requested direction is neither `1` nor `-1`. Raised before any store access.
    #[error("Invalid vote direction: {0}")]
    InvalidDirection(i64),

    /// The store failed or could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] VotesRepositoryError),

    /// A concurrent writer held or changed the same ledger rows.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(#[source] VotesRepositoryError),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl VotesError {
    /// Whether the caller may reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VotesError::TransactionConflict(_))
    }
}

impl From<VotesRepositoryError> for VotesError {
    fn from(error: VotesRepositoryError) -> Self {
        if error.is_conflict() {
            VotesError::TransactionConflict(error)
        } else {
            VotesError::StoreUnavailable(error)
        }
    }
}

impl From<InvalidDirection> for VotesError {
    fn from(error: InvalidDirection) -> Self {
        VotesError::InvalidDirection(error.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_are_classified() {
        let conflict = VotesError::from(VotesRepositoryError::Conflict("lost race".to_string()));
        assert!(matches!(conflict, VotesError::TransactionConflict(_)));
        assert!(conflict.is_retryable());

        let unavailable = VotesError::from(VotesRepositoryError::InvalidDirection(9));
        assert!(matches!(unavailable, VotesError::StoreUnavailable(_)));
        assert!(!unavailable.is_retryable());
    }

    #[test]
    fn test_invalid_direction_conversion() {
        let error = VotesError::from(InvalidDirection(7));
        assert!(matches!(error, VotesError::InvalidDirection(7)));
        assert_eq!(error.to_string(), "Invalid vote direction: 7");
    }
}
