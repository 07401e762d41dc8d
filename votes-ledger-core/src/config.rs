//! Configuration types for the votes ledger core.
use crate::errors::VotesError;

/// Configuration for the aggregator and relation index.
///
/// Batched reads issue one query per entity type no matter how many ids they
/// carry. Deployments that want to bound the size of those queries can opt
/// into a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotesConfig {
    /// Maximum number of entities allowed in a single batched read.
    ///
    /// `None` (the default) accepts batches of any size.
    pub max_batch_size: Option<usize>,
}

impl VotesConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }

    pub(crate) fn validate_batch_size(&self, size: usize) -> Result<(), VotesError> {
        match self.max_batch_size {
            Some(max) if size > max => Err(VotesError::BatchSizeExceeded { provided: size, max }),
            _ => Ok(()),
        }
    }
}
