//! Batched vote counters.
//!
//! Counters are computed from the ledger at query time; nothing is cached.
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use votes_ledger_repository::VotesRepository;
use votes_ledger_shared::types::{EntityRef, Identifiable, TypedBatch, VoteCounters};
use crate::config::VotesConfig;
use crate::errors::VotesError;

/// Computes `VoteCounters` for votables, one store query per votable type.
pub struct Aggregator {
    repository: Arc<dyn VotesRepository>,
    config: VotesConfig,
}

impl Aggregator {
    pub fn new(repository: Arc<dyn VotesRepository>, config: VotesConfig) -> Self {
        Self { repository, config }
    }

    /// Returns the counters of every given votable.
    ///
    /// Duplicates are collapsed and votables without votes map to zero
    /// counters, so the result holds exactly one entry per distinct input.
    ///
    /// # Errors
    ///
    /// * `VotesError::BatchSizeExceeded` - more distinct votables than `max_batch_size`
    /// * `VotesError::StoreUnavailable` - a batch query failed
    pub async fn with_totals<T: Identifiable>(
        &self,
        votables: &[T],
    ) -> Result<HashMap<EntityRef, VoteCounters>, VotesError> {
        let mut totals: HashMap<EntityRef, VoteCounters> = HashMap::new();
        let mut refs = Vec::with_capacity(votables.len());
        for votable in votables {
            let votable = votable.entity_ref();
            if totals.insert(votable.clone(), VoteCounters::default()).is_none() {
                refs.push(votable);
            }
        }
        self.config.validate_batch_size(refs.len())?;

        for batch in TypedBatch::group(&refs) {
            let counts = self.repository.get_vote_counts(&batch).await?;
            debug!(
                votable_type = %batch.entity_type,
                requested = batch.ids.len(),
                voted = counts.len(),
                "Loaded vote counts"
            );
            for count in &counts {
                totals.insert(count.votable.clone(), VoteCounters::from(count));
            }
        }

        Ok(totals)
    }

    /// Returns the counters of a single votable.
    pub async fn totals(&self, votable: &impl Identifiable) -> Result<VoteCounters, VotesError> {
        let votable = votable.entity_ref();
        let totals = self.with_totals(std::slice::from_ref(&votable)).await?;
        Ok(totals.get(&votable).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopSink;
    use crate::writer::VoteWriter;
    use votes_ledger_repository::InMemoryVotesRepository;
    use votes_ledger_shared::types::Direction;

    fn user(id: u32) -> EntityRef {
        EntityRef::new("user", id)
    }

    fn setup(config: VotesConfig) -> (Aggregator, VoteWriter, Arc<InMemoryVotesRepository>) {
        let repository = Arc::new(InMemoryVotesRepository::new());
        (
            Aggregator::new(repository.clone(), config),
            VoteWriter::new(repository.clone(), Arc::new(NoopSink)),
            repository,
        )
    }

    #[tokio::test]
    async fn test_totals_scenario() {
        let (aggregator, writer, _) = setup(VotesConfig::default());
        let idea = EntityRef::new("idea", 1);

        writer.up_vote(&user(1), &idea).await.unwrap();
        writer.up_vote(&user(2), &idea).await.unwrap();
        writer.up_vote(&user(3), &idea).await.unwrap();
        writer.down_vote(&user(4), &idea).await.unwrap();

        let counters = aggregator.totals(&idea).await.unwrap();
        assert_eq!(counters.total_votes, 2);
        assert_eq!(counters.up_votes, 3);
        assert_eq!(counters.down_votes, 1);
    }

    #[tokio::test]
    async fn test_flip_moves_total_by_two() {
        let (aggregator, writer, _) = setup(VotesConfig::default());
        let idea = EntityRef::new("idea", 1);

        writer.up_vote(&user(1), &idea).await.unwrap();
        assert_eq!(aggregator.totals(&idea).await.unwrap().total_votes, 1);

        writer.down_vote(&user(1), &idea).await.unwrap();
        assert_eq!(aggregator.totals(&idea).await.unwrap().total_votes, -1);

        writer.cancel_vote(&user(1), &idea).await.unwrap();
        assert_eq!(aggregator.totals(&idea).await.unwrap(), VoteCounters::default());
    }

    #[tokio::test]
    async fn test_one_round_trip_per_type() {
        let (aggregator, writer, repository) = setup(VotesConfig::default());
        let votables: Vec<_> = (1..=5)
            .map(|id| EntityRef::new("idea", id))
            .chain((1..=3).map(|id| EntityRef::new("feature", id)))
            .collect();
        for (i, votable) in votables.iter().enumerate() {
            writer.up_vote(&user(i as u32), votable).await.unwrap();
        }

        let before = repository.round_trips();
        let totals = aggregator.with_totals(&votables).await.unwrap();

        assert_eq!(repository.round_trips() - before, 2);
        assert_eq!(totals.len(), votables.len());
        assert!(totals.values().all(|c| c.up_votes == 1 && c.total_votes == 1));
    }

    #[tokio::test]
    async fn test_batch_matches_single_lookups() {
        let (aggregator, writer, _) = setup(VotesConfig::default());
        let votables: Vec<_> = (1..=4).map(|id| EntityRef::new("idea", id)).collect();
        for (voter, votable, direction) in [
            (1, 0, Direction::Up),
            (2, 0, Direction::Down),
            (1, 1, Direction::Down),
            (3, 2, Direction::Up),
            (4, 2, Direction::Up),
        ] {
            writer.cast_vote(&user(voter), &votables[votable], direction).await.unwrap();
        }

        let batch = aggregator.with_totals(&votables).await.unwrap();
        for votable in &votables {
            assert_eq!(batch[votable], aggregator.totals(votable).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_unvoted_and_duplicate_votables() {
        let (aggregator, _, repository) = setup(VotesConfig::default());
        let idea = EntityRef::new("idea", 9);

        let totals = aggregator.with_totals(&[idea.clone(), idea.clone()]).await.unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&idea], VoteCounters::default());
        assert_eq!(repository.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_skips_store() {
        let (aggregator, _, repository) = setup(VotesConfig::default());

        let totals = aggregator.with_totals::<EntityRef>(&[]).await.unwrap();

        assert!(totals.is_empty());
        assert_eq!(repository.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_large_batch_with_default_config() {
        let (aggregator, writer, repository) = setup(VotesConfig::default());
        let votables: Vec<_> = (0..5_001).map(|id| EntityRef::new("idea", id)).collect();
        writer.up_vote(&user(1), &votables[5_000]).await.unwrap();
        let before = repository.round_trips();

        let totals = aggregator.with_totals(&votables).await.unwrap();

        assert_eq!(totals.len(), 5_001);
        assert_eq!(totals[&votables[0]], VoteCounters::default());
        assert_eq!(totals[&votables[5_000]], VoteCounters::new(1, 0));
        assert_eq!(repository.round_trips() - before, 1);
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let (aggregator, _, repository) = setup(VotesConfig::with_max_batch_size(2));
        let votables: Vec<_> = (1..=3).map(|id| EntityRef::new("idea", id)).collect();

        let result = aggregator.with_totals(&votables).await;

        assert!(matches!(result, Err(VotesError::BatchSizeExceeded { provided: 3, max: 2 })));
        assert_eq!(repository.round_trips(), 0);
    }
}
