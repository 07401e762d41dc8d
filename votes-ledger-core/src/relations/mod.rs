//! Voter and votable relations.
//!
//! Listing queries always go to the store. Membership checks (`has_voted` and
//! friends) accept an optional [`LoadedVotes`] obtained from one of the batch
//! loaders; when it covers the queried key the answer comes from memory and
//! the store is not touched.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use votes_ledger_repository::VotesRepository;
use votes_ledger_shared::types::{
    Direction, EntityRef, Identifiable, TypedBatch, Vote, VoteFilter, VoteKey,
};
use crate::config::VotesConfig;
use crate::errors::VotesError;

/// Which end of the vote a `LoadedVotes` was loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSide {
    /// Votes cast by the owner.
    Voter,
    /// Votes received by the owner.
    Votable,
}

/// Votes preloaded for a single owner.
///
/// Carries the filter it was loaded with, so it only answers questions the
/// loaded set is complete for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedVotes {
    owner: EntityRef,
    side: RelationSide,
    filter: VoteFilter,
    votes: Vec<Vote>,
}

impl LoadedVotes {
    pub(crate) fn new(owner: EntityRef, side: RelationSide, filter: VoteFilter) -> Self {
        Self {
            owner,
            side,
            filter,
            votes: Vec::new(),
        }
    }

    pub fn owner(&self) -> &EntityRef {
        &self.owner
    }

    pub fn side(&self) -> RelationSide {
        self.side
    }

    pub fn filter(&self) -> &VoteFilter {
        &self.filter
    }

    /// Loaded votes, oldest first.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn voters(&self) -> Vec<EntityRef> {
        self.votes.iter().map(|v| v.voter.clone()).collect()
    }

    pub fn votables(&self) -> Vec<EntityRef> {
        self.votes.iter().map(|v| v.votable.clone()).collect()
    }

    pub fn find(&self, key: &VoteKey) -> Option<&Vote> {
        self.votes.iter().find(|v| v.voter == key.voter && v.votable == key.votable)
    }

    /// Whether this set is complete for a membership check on `key`.
    pub fn covers(&self, key: &VoteKey, direction: Option<Direction>) -> bool {
        let owned = match self.side {
            RelationSide::Voter => key.voter == self.owner,
            RelationSide::Votable => key.votable == self.owner,
        };
        let type_covered = self
            .filter
            .votable_type
            .as_deref()
            .is_none_or(|t| t == key.votable.entity_type);
        let direction_covered = self.filter.direction.is_none_or(|d| Some(d) == direction);

        owned && type_covered && direction_covered
    }

    /// Answers a membership check from memory, or `None` if this set does not cover it.
    pub fn answers(&self, key: &VoteKey, direction: Option<Direction>) -> Option<bool> {
        if !self.covers(key, direction) {
            return None;
        }
        Some(
            self.find(key)
                .is_some_and(|v| direction.is_none_or(|d| d == v.direction)),
        )
    }
}

/// Queries who voted on what.
pub struct RelationIndex {
    repository: Arc<dyn VotesRepository>,
    config: VotesConfig,
}

impl RelationIndex {
    pub fn new(repository: Arc<dyn VotesRepository>, config: VotesConfig) -> Self {
        Self { repository, config }
    }

    /// Returns the voters of `votable`, oldest vote first.
    pub async fn voters_of(&self, votable: &impl Identifiable) -> Result<Vec<EntityRef>, VotesError> {
        self.voters_in_direction(votable, None).await
    }

    pub async fn up_voters_of(&self, votable: &impl Identifiable) -> Result<Vec<EntityRef>, VotesError> {
        self.voters_in_direction(votable, Some(Direction::Up)).await
    }

    pub async fn down_voters_of(&self, votable: &impl Identifiable) -> Result<Vec<EntityRef>, VotesError> {
        self.voters_in_direction(votable, Some(Direction::Down)).await
    }

    /// Returns the votables `voter` voted on, optionally restricted to one type.
    pub async fn votables_of(
        &self,
        voter: &impl Identifiable,
        votable_type: Option<&str>,
    ) -> Result<Vec<EntityRef>, VotesError> {
        let filter = VoteFilter {
            votable_type: votable_type.map(str::to_string),
            direction: None,
        };
        let votes = self.votes_of(voter, &filter).await?;
        Ok(distinct(votes.into_iter().map(|v| v.votable)))
    }

    /// Returns the votes cast by `voter` that match `filter`, oldest first.
    pub async fn votes_of(
        &self,
        voter: &impl Identifiable,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>, VotesError> {
        let batch = TypedBatch::single(&voter.entity_ref());
        Ok(self.repository.get_votes_by_voters(&batch, filter).await?)
    }

    /// Loads the votes cast by each voter, one store query per voter type.
    ///
    /// Every requested voter gets an entry, empty if it has not voted.
    pub async fn load_votes_of<T: Identifiable>(
        &self,
        voters: &[T],
        filter: &VoteFilter,
    ) -> Result<HashMap<EntityRef, LoadedVotes>, VotesError> {
        let (mut loaded, owners) = self.prepare(voters, RelationSide::Voter, filter)?;

        for batch in TypedBatch::group(&owners) {
            let votes = self.repository.get_votes_by_voters(&batch, filter).await?;
            debug!(voter_type = %batch.entity_type, voters = batch.ids.len(), votes = votes.len(), "Loaded votes of voters");
            for vote in votes {
                if let Some(entry) = loaded.get_mut(&vote.voter) {
                    entry.votes.push(vote);
                }
            }
        }

        Ok(loaded)
    }

    /// Loads the votes received by each votable, one store query per votable type.
    pub async fn load_voters_of<T: Identifiable>(
        &self,
        votables: &[T],
        direction: Option<Direction>,
    ) -> Result<HashMap<EntityRef, LoadedVotes>, VotesError> {
        let filter = VoteFilter {
            votable_type: None,
            direction,
        };
        let (mut loaded, owners) = self.prepare(votables, RelationSide::Votable, &filter)?;

        for batch in TypedBatch::group(&owners) {
            let votes = self.repository.get_votes_for_votables(&batch, direction).await?;
            debug!(votable_type = %batch.entity_type, votables = batch.ids.len(), votes = votes.len(), "Loaded voters of votables");
            for vote in votes {
                if let Some(entry) = loaded.get_mut(&vote.votable) {
                    entry.votes.push(vote);
                }
            }
        }

        Ok(loaded)
    }

    /// Whether `voter` has a vote on `votable` in either direction.
    pub async fn has_voted(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        loaded: Option<&LoadedVotes>,
    ) -> Result<bool, VotesError> {
        self.check(VoteKey::new(voter.entity_ref(), votable.entity_ref()), None, loaded).await
    }

    pub async fn has_up_voted(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        loaded: Option<&LoadedVotes>,
    ) -> Result<bool, VotesError> {
        let key = VoteKey::new(voter.entity_ref(), votable.entity_ref());
        self.check(key, Some(Direction::Up), loaded).await
    }

    pub async fn has_down_voted(
        &self,
        voter: &impl Identifiable,
        votable: &impl Identifiable,
        loaded: Option<&LoadedVotes>,
    ) -> Result<bool, VotesError> {
        let key = VoteKey::new(voter.entity_ref(), votable.entity_ref());
        self.check(key, Some(Direction::Down), loaded).await
    }

    /// Same question as `has_voted`, asked from the votable's side.
    pub async fn has_been_voted_by(
        &self,
        votable: &impl Identifiable,
        voter: &impl Identifiable,
        loaded: Option<&LoadedVotes>,
    ) -> Result<bool, VotesError> {
        self.check(VoteKey::new(voter.entity_ref(), votable.entity_ref()), None, loaded).await
    }

    async fn voters_in_direction(
        &self,
        votable: &impl Identifiable,
        direction: Option<Direction>,
    ) -> Result<Vec<EntityRef>, VotesError> {
        let batch = TypedBatch::single(&votable.entity_ref());
        let votes = self.repository.get_votes_for_votables(&batch, direction).await?;
        Ok(distinct(votes.into_iter().map(|v| v.voter)))
    }

    async fn check(
        &self,
        key: VoteKey,
        direction: Option<Direction>,
        loaded: Option<&LoadedVotes>,
    ) -> Result<bool, VotesError> {
        if let Some(answer) = loaded.and_then(|l| l.answers(&key, direction)) {
            return Ok(answer);
        }

        let vote = self.repository.find_vote(&key).await?;
        Ok(vote.is_some_and(|v| direction.is_none_or(|d| d == v.direction)))
    }

    fn prepare<T: Identifiable>(
        &self,
        owners: &[T],
        side: RelationSide,
        filter: &VoteFilter,
    ) -> Result<(HashMap<EntityRef, LoadedVotes>, Vec<EntityRef>), VotesError> {
        let mut loaded = HashMap::new();
        let mut refs = Vec::with_capacity(owners.len());
        for owner in owners {
            let owner = owner.entity_ref();
            if !loaded.contains_key(&owner) {
                loaded.insert(owner.clone(), LoadedVotes::new(owner.clone(), side, filter.clone()));
                refs.push(owner);
            }
        }
        self.config.validate_batch_size(refs.len())?;
        Ok((loaded, refs))
    }
}

/// Drops repeated entities, keeping the first occurrence of each.
fn distinct(entities: impl Iterator<Item = EntityRef>) -> Vec<EntityRef> {
    let mut seen = HashSet::new();
    entities.filter(|entity| seen.insert(entity.clone())).collect()
}
