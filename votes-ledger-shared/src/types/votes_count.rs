use serde::{Deserialize, Serialize};
use crate::types::EntityRef;

/// Represents the aggregated vote counts of one votable as read from the store.
///
/// Votables without any vote produce no `VotesCount` row at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotesCount {
    pub votable: EntityRef,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Derived counters for a votable.
///
/// Always recomputed from the ledger; `total_votes` is the sum of directions,
/// so `total_votes == up_votes - down_votes` holds by construction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCounters {
    pub total_votes: i64,
    pub up_votes: i64,
    pub down_votes: i64,
}

impl VoteCounters {
    pub fn new(up_votes: i64, down_votes: i64) -> Self {
        Self {
            total_votes: up_votes - down_votes,
            up_votes,
            down_votes,
        }
    }
}

impl From<&VotesCount> for VoteCounters {
    fn from(count: &VotesCount) -> Self {
        VoteCounters::new(count.upvotes, count.downvotes)
    }
}
