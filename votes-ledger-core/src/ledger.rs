use std::sync::Arc;
use votes_ledger_repository::VotesRepository;
use crate::aggregator::Aggregator;
use crate::config::VotesConfig;
use crate::events::VoteEventSink;
use crate::relations::RelationIndex;
use crate::writer::VoteWriter;

/// The writer, aggregator and relation index wired to one shared store.
pub struct VoteLedger {
    pub writer: VoteWriter,
    pub aggregator: Aggregator,
    pub relations: RelationIndex,
}

impl VoteLedger {
    /// Creates a new `VoteLedger`.
    ///
    /// # Arguments
    ///
    /// * `repository` - The ledger store shared by all components
    /// * `sink` - Receives the events emitted by the writer
    /// * `config` - Limits applied to batched reads
    pub fn new(
        repository: Arc<dyn VotesRepository>,
        sink: Arc<dyn VoteEventSink>,
        config: VotesConfig,
    ) -> Self {
        Self {
            writer: VoteWriter::new(repository.clone(), sink),
            aggregator: Aggregator::new(repository.clone(), config.clone()),
            relations: RelationIndex::new(repository, config),
        }
    }
}
