use serde::{Deserialize, Serialize};
use crate::types::{EntityRef, Vote};

/// Notification emitted after a ledger mutation has been committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum VoteEvent {
    /// A vote was created, or flipped to the opposite direction (`is_update`).
    Voted { vote: Vote, is_update: bool },
    /// A vote was removed from the ledger.
    VoteCancelled { voter: EntityRef, votable: EntityRef },
}

impl VoteEvent {
    pub fn voter(&self) -> &EntityRef {
        match self {
            VoteEvent::Voted { vote, .. } => &vote.voter,
            VoteEvent::VoteCancelled { voter, .. } => voter,
        }
    }

    pub fn votable(&self) -> &EntityRef {
        match self {
            VoteEvent::Voted { vote, .. } => &vote.votable,
            VoteEvent::VoteCancelled { votable, .. } => votable,
        }
    }
}
