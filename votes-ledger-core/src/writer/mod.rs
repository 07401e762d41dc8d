//! This module defines the `VoteWriter`, the only component that mutates the ledger.
//!
//! Each call resolves to one atomic `VotesRepository::apply_command` and, when
//! the ledger actually changed, one event handed to the sink after commit.
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};
use votes_ledger_repository::{VotesRepository, VotesRepositoryError};
use votes_ledger_shared::types::{
    Direction, Identifiable, LedgerChange, Vote, VoteCommand, VoteKey,
};
use crate::errors::VotesError;
use crate::events::VoteEventSink;

/// `VoteWriter` applies casts, cancellations and toggles to the ledger.
///
/// Re-casting the direction already stored is a no-op: nothing is written
/// and no event is emitted.
pub struct VoteWriter {
    repository: Arc<dyn VotesRepository>,
    sink: Arc<dyn VoteEventSink>,
}

impl VoteWriter {
    /// Creates a new `VoteWriter`.
    ///
    /// # Arguments
    ///
    /// * `repository` - The ledger store
    /// * `sink` - Receives one event per committed change
    pub fn new(repository: Arc<dyn VotesRepository>, sink: Arc<dyn VoteEventSink>) -> Self {
        Self { repository, sink }
    }

    /// Casts a vote given as a raw signed value.
    ///
    /// # Errors
    ///
    /// Returns `VotesError::InvalidDirection` for any value other than `1`
    /// or `-1`; the store is not touched in that case.
    pub async fn vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        direction: i64,
    ) -> Result<Vote, VotesError> {
        let direction = Direction::try_from(direction)?;
        self.cast_vote(voter, votable, direction).await
    }

    pub async fn up_vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
    ) -> Result<Vote, VotesError> {
        self.cast_vote(voter, votable, Direction::Up).await
    }

    pub async fn down_vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
    ) -> Result<Vote, VotesError> {
        self.cast_vote(voter, votable, Direction::Down).await
    }

    /// Records `direction` as the voter's vote on the votable.
    ///
    /// Inserts a new vote, flips an opposite one in place, or leaves an
    /// identical one untouched.
    ///
    /// # Returns
    ///
    /// The vote as stored after the call.
    pub async fn cast_vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        direction: Direction,
    ) -> Result<Vote, VotesError> {
        let key = VoteKey::new(voter.entity_ref(), votable.entity_ref());
        let change = self.apply(&key, VoteCommand::Cast(direction)).await?;

        change.into_current().ok_or_else(|| {
            VotesError::TransactionConflict(VotesRepositoryError::Conflict(format!(
                "vote {} -> {} missing after cast",
                key.voter, key.votable
            )))
        })
    }

    /// Removes the voter's vote on the votable. Absent votes are not an error.
    pub async fn cancel_vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
    ) -> Result<(), VotesError> {
        let key = VoteKey::new(voter.entity_ref(), votable.entity_ref());
        self.apply(&key, VoteCommand::Cancel).await?;
        Ok(())
    }

    /// Cancels an identical vote, otherwise casts `direction`.
    ///
    /// # Returns
    ///
    /// The stored vote, or `None` if the toggle removed it.
    pub async fn toggle_vote(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        direction: Direction,
    ) -> Result<Option<Vote>, VotesError> {
        let key = VoteKey::new(voter.entity_ref(), votable.entity_ref());
        let change = self.apply(&key, VoteCommand::Toggle(direction)).await?;
        Ok(change.into_current())
    }

    async fn apply(&self, key: &VoteKey, command: VoteCommand) -> Result<LedgerChange, VotesError> {
        let change = self
            .repository
            .apply_command(key, command, OffsetDateTime::now_utc())
            .await
            .map_err(|e| {
                warn!(voter = %key.voter, votable = %key.votable, ?command, error = %e, "Vote write failed");
                VotesError::from(e)
            })?;

        match change.event() {
            Some(event) => {
                debug!(voter = %key.voter, votable = %key.votable, ?command, "Vote ledger changed");
                self.sink.notify(&event);
            }
            None => debug!(voter = %key.voter, votable = %key.votable, ?command, "Vote ledger unchanged"),
        }

        Ok(change)
    }
}
