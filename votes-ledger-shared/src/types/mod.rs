mod command;
mod entity;
mod event;
mod vote;
mod votes_count;

pub use command::{LedgerChange, LedgerWrite, VoteCommand};
pub use entity::{BatchMembers, EntityRef, Identifiable, TypedBatch, VoteKey};
pub use event::VoteEvent;
pub use vote::{Direction, Vote, VoteFilter};
pub use votes_count::{VoteCounters, VotesCount};
