//! # Votes Ledger Shared
//! This crate defines the data structures shared across the votes ledger crates.
//! It includes polymorphic entity references, votes, vote counts, the vote
//! transition policy and the events emitted when the ledger changes.
pub mod errors;
pub mod types;
