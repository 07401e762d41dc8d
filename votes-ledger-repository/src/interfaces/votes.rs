//! This module defines the `VotesRepository` trait, which provides an interface
//! for interacting with the underlying store of vote ledger entries.
//! It abstracts the atomic vote mutation and the batched read paths.
use votes_ledger_shared::types::{
    Direction, LedgerChange, TypedBatch, Vote, VoteCommand, VoteFilter, VoteKey, VotesCount,
};
use time::OffsetDateTime;
use crate::errors::VotesRepositoryError;

/// A trait that defines the interface for interacting with the votes ledger store.
///
/// Every method is a single round trip to the store. Batched reads take one
/// `TypedBatch` so callers control how many round trips a batch costs.
#[async_trait::async_trait]
pub trait VotesRepository: Send + Sync {
    /// Creates the ledger table and its indexes if they do not exist yet.
    async fn ensure_schema(&self) -> Result<(), VotesRepositoryError>;

    /// Checks whether the ledger table exists.
    async fn schema_exists(&self) -> Result<bool, VotesRepositoryError>;

    /// Applies a vote command to one `(voter, votable)` key atomically.
    ///
    /// The stored vote is read, the command is planned against it and the
    /// resulting write is performed without any concurrent mutation of the
    /// same key in between. Nothing is written when the plan is a no-op.
    ///
    /// # Arguments
    ///
    /// * `key` - The voter/votable pair to mutate
    /// * `command` - The requested mutation
    /// * `at` - Timestamp recorded as `created_at`/`updated_at`
    ///
    /// # Returns
    ///
    /// The committed `LedgerChange`, or an error with the ledger unchanged.
    async fn apply_command(
        &self,
        key: &VoteKey,
        command: VoteCommand,
        at: OffsetDateTime,
    ) -> Result<LedgerChange, VotesRepositoryError>;

    /// Point lookup of the vote stored for a key.
    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VotesRepositoryError>;

    /// Retrieves up/down counts for a batch of votables of one type.
    ///
    /// Votables without votes are absent from the result.
    async fn get_vote_counts(
        &self,
        votables: &TypedBatch,
    ) -> Result<Vec<VotesCount>, VotesRepositoryError>;

    /// Retrieves the votes received by a batch of votables of one type,
    /// oldest first.
    ///
    /// Age follows the ledger's insertion sequence (`Vote::id`), never the
    /// recorded timestamps.
    async fn get_votes_for_votables(
        &self,
        votables: &TypedBatch,
        direction: Option<Direction>,
    ) -> Result<Vec<Vote>, VotesRepositoryError>;

    /// Retrieves the votes cast by a batch of voters of one type, oldest first.
    async fn get_votes_by_voters(
        &self,
        voters: &TypedBatch,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>, VotesRepositoryError>;
}
