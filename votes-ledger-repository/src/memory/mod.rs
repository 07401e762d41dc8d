//! In-process implementation of the votes ledger repository.
//!
//! Keeps the ledger in a map guarded by a `tokio::sync::Mutex`. Every vote
//! mutation holds the lock across read, plan and write, which gives the same
//! per-key atomicity the PostgreSQL backend gets from row locks.
//!
//! Each trait call counts as one store round trip; [`InMemoryVotesRepository::round_trips`]
//! exposes the counter so callers can verify their batching.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use votes_ledger_shared::types::{
    Direction, LedgerChange, LedgerWrite, TypedBatch, Vote, VoteCommand, VoteFilter, VoteKey,
    VotesCount,
};
use crate::{VotesRepository, VotesRepositoryError};

#[derive(Debug, Default)]
struct LedgerState {
    votes: HashMap<VoteKey, Vote>,
    last_id: i64,
}

impl LedgerState {
    fn sorted(mut votes: Vec<Vote>) -> Vec<Vote> {
        votes.sort_by_key(Vote::creation_order);
        votes
    }
}

/// In-memory votes ledger.
#[derive(Debug, Default)]
pub struct InMemoryVotesRepository {
    state: Mutex<LedgerState>,
    round_trips: AtomicUsize,
}

impl InMemoryVotesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of repository calls served so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Number of votes currently in the ledger.
    pub async fn len(&self) -> usize {
        self.state.lock().await.votes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn record_round_trip(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VotesRepository for InMemoryVotesRepository {
    async fn ensure_schema(&self) -> Result<(), VotesRepositoryError> {
        self.record_round_trip();
        Ok(())
    }

    async fn schema_exists(&self) -> Result<bool, VotesRepositoryError> {
        self.record_round_trip();
        Ok(true)
    }

    async fn apply_command(
        &self,
        key: &VoteKey,
        command: VoteCommand,
        at: OffsetDateTime,
    ) -> Result<LedgerChange, VotesRepositoryError> {
        self.record_round_trip();
        let mut state = self.state.lock().await;

        let current = state.votes.get(key).cloned();
        let change = match (command.plan(current.as_ref().map(|v| v.direction)), current) {
            (LedgerWrite::Keep, current) => LedgerChange::Unchanged(current),
            (LedgerWrite::Insert(direction), _) => {
                state.last_id += 1;
                let vote = Vote {
                    id: state.last_id,
                    voter: key.voter.clone(),
                    votable: key.votable.clone(),
                    direction,
                    created_at: at,
                    updated_at: at,
                };
                state.votes.insert(key.clone(), vote.clone());
                LedgerChange::Created(vote)
            }
            (LedgerWrite::Update(direction), Some(stored)) => {
                let vote = Vote {
                    direction,
                    updated_at: at,
                    ..stored.clone()
                };
                state.votes.insert(key.clone(), vote.clone());
                LedgerChange::Updated {
                    vote,
                    previous: stored.direction,
                }
            }
            (LedgerWrite::Delete, Some(stored)) => {
                state.votes.remove(key);
                LedgerChange::Deleted(stored)
            }
            (write, None) => {
                return Err(VotesRepositoryError::Conflict(format!(
                    "planned {write:?} without a stored vote for {} -> {}",
                    key.voter, key.votable
                )));
            }
        };

        Ok(change)
    }

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VotesRepositoryError> {
        self.record_round_trip();
        Ok(self.state.lock().await.votes.get(key).cloned())
    }

    async fn get_vote_counts(
        &self,
        votables: &TypedBatch,
    ) -> Result<Vec<VotesCount>, VotesRepositoryError> {
        self.record_round_trip();
        let state = self.state.lock().await;

        let members = votables.members();
        let mut counts: HashMap<_, VotesCount> = HashMap::new();
        for vote in state.votes.values().filter(|v| members.contains(&v.votable)) {
            let count = counts.entry(vote.votable.clone()).or_insert_with(|| VotesCount {
                votable: vote.votable.clone(),
                upvotes: 0,
                downvotes: 0,
            });
            match vote.direction {
                Direction::Up => count.upvotes += 1,
                Direction::Down => count.downvotes += 1,
            }
        }

        Ok(counts.into_values().collect())
    }

    async fn get_votes_for_votables(
        &self,
        votables: &TypedBatch,
        direction: Option<Direction>,
    ) -> Result<Vec<Vote>, VotesRepositoryError> {
        self.record_round_trip();
        let state = self.state.lock().await;
        let members = votables.members();

        let votes = state
            .votes
            .values()
            .filter(|v| members.contains(&v.votable))
            .filter(|v| direction.is_none_or(|d| d == v.direction))
            .cloned()
            .collect();

        Ok(LedgerState::sorted(votes))
    }

    async fn get_votes_by_voters(
        &self,
        voters: &TypedBatch,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>, VotesRepositoryError> {
        self.record_round_trip();
        let state = self.state.lock().await;
        let members = voters.members();

        let votes = state
            .votes
            .values()
            .filter(|v| members.contains(&v.voter) && filter.matches(v))
            .cloned()
            .collect();

        Ok(LedgerState::sorted(votes))
    }
}
