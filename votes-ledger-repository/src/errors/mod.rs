//! Error types for the votes ledger repository.
//! Consolidates and re-exports error types related to ledger storage operations.
mod votes;

pub use votes::VotesRepositoryError;
