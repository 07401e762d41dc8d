//! Error types for the shared votes ledger types.
use thiserror::Error;

/// Raised when a raw integer cannot be interpreted as a vote direction.
///
/// Only `1` (up) and `-1` (down) are valid.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Invalid vote direction: {0}")]
pub struct InvalidDirection(pub i64);
