//! # Votes Ledger Core
//! This crate implements the voting semantics on top of a `VotesRepository`:
//! the vote writer and its transition policy, batched aggregation of vote
//! counters, the voter/votable relation index and post-commit event delivery.
pub mod aggregator;
pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod relations;
pub mod writer;

pub use aggregator::Aggregator;
pub use config::VotesConfig;
pub use errors::VotesError;
pub use events::{ChannelSink, NoopSink, TracingSink, VoteEventSink};
pub use ledger::VoteLedger;
pub use relations::{LoadedVotes, RelationIndex, RelationSide};
pub use writer::VoteWriter;
