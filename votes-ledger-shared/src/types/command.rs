//! The vote transition policy.
//!
//! Stores call [`VoteCommand::plan`] while holding the key exclusively, so the
//! decision and the write it produces are one atomic step.
use crate::types::{Direction, Vote, VoteEvent};

/// A mutation requested for one `(voter, votable)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteCommand {
    /// Insert the vote, or flip an existing vote of the opposite direction.
    Cast(Direction),
    /// Remove the vote if one exists.
    Cancel,
    /// Remove an identical vote, otherwise behave like `Cast`.
    Toggle(Direction),
}

/// The single store write a command resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Insert(Direction),
    Update(Direction),
    Delete,
    Keep,
}

impl VoteCommand {
    /// Resolves the command against the direction currently stored for the key.
    pub fn plan(self, current: Option<Direction>) -> LedgerWrite {
        match (self, current) {
            (VoteCommand::Cast(requested), None) => LedgerWrite::Insert(requested),
            (VoteCommand::Cast(requested), Some(stored)) if stored == requested => LedgerWrite::Keep,
            (VoteCommand::Cast(requested), Some(_)) => LedgerWrite::Update(requested),
            (VoteCommand::Cancel, None) => LedgerWrite::Keep,
            (VoteCommand::Cancel, Some(_)) => LedgerWrite::Delete,
            (VoteCommand::Toggle(requested), Some(stored)) if stored == requested => LedgerWrite::Delete,
            (VoteCommand::Toggle(requested), current) => VoteCommand::Cast(requested).plan(current),
        }
    }
}

/// What a command actually did to the ledger, as reported by the store after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    Created(Vote),
    Updated { vote: Vote, previous: Direction },
    Deleted(Vote),
    /// Nothing was written; carries the stored vote, if any.
    Unchanged(Option<Vote>),
}

impl LedgerChange {
    /// The vote present in the ledger after the command.
    pub fn current(&self) -> Option<&Vote> {
        match self {
            LedgerChange::Created(vote) | LedgerChange::Updated { vote, .. } => Some(vote),
            LedgerChange::Deleted(_) => None,
            LedgerChange::Unchanged(vote) => vote.as_ref(),
        }
    }

    pub fn into_current(self) -> Option<Vote> {
        match self {
            LedgerChange::Created(vote) | LedgerChange::Updated { vote, .. } => Some(vote),
            LedgerChange::Deleted(_) => None,
            LedgerChange::Unchanged(vote) => vote,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, LedgerChange::Unchanged(_))
    }

    /// The notification owed for this change; unchanged ledgers emit nothing.
    pub fn event(&self) -> Option<VoteEvent> {
        match self {
            LedgerChange::Created(vote) => Some(VoteEvent::Voted {
                vote: vote.clone(),
                is_update: false,
            }),
            LedgerChange::Updated { vote, .. } => Some(VoteEvent::Voted {
                vote: vote.clone(),
                is_update: true,
            }),
            LedgerChange::Deleted(vote) => Some(VoteEvent::VoteCancelled {
                voter: vote.voter.clone(),
                votable: vote.votable.clone(),
            }),
            LedgerChange::Unchanged(_) => None,
        }
    }
}
