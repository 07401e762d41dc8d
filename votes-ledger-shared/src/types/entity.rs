use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A polymorphic reference to an entity taking part in voting.
///
/// Voters and votables are never inspected beyond this `(type, id)` pair. The
/// id is kept opaque so integer, UUID and string keys are all representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Implemented by domain entities that can act as a voter or a votable.
pub trait Identifiable {
    fn entity_ref(&self) -> EntityRef;
}

impl Identifiable for EntityRef {
    fn entity_ref(&self) -> EntityRef {
        self.clone()
    }
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    fn entity_ref(&self) -> EntityRef {
        (**self).entity_ref()
    }
}

/// The unique key of a ledger entry: at most one vote exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteKey {
    pub voter: EntityRef,
    pub votable: EntityRef,
}

impl VoteKey {
    pub fn new(voter: EntityRef, votable: EntityRef) -> Self {
        Self { voter, votable }
    }
}

/// A set of ids sharing one entity type.
///
/// Batch reads are issued per `TypedBatch`, so the number of store round
/// trips is bounded by the number of distinct types rather than entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedBatch {
    pub entity_type: String,
    pub ids: Vec<String>,
}

impl TypedBatch {
    /// A batch holding a single entity.
    pub fn single(entity: &EntityRef) -> Self {
        Self {
            entity_type: entity.entity_type.clone(),
            ids: vec![entity.id.clone()],
        }
    }

    /// Groups entity references by type, dropping duplicate ids.
    ///
    /// Batches are ordered by type name and ids keep their first-seen order.
    pub fn group(entities: &[EntityRef]) -> Vec<TypedBatch> {
        let mut seen: HashSet<&EntityRef> = HashSet::with_capacity(entities.len());
        let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for entity in entities {
            if seen.insert(entity) {
                grouped
                    .entry(entity.entity_type.as_str())
                    .or_default()
                    .push(entity.id.clone());
            }
        }

        grouped
            .into_iter()
            .map(|(entity_type, ids)| TypedBatch {
                entity_type: entity_type.to_string(),
                ids,
            })
            .collect()
    }

    /// Hashed view of the batch for repeated membership checks.
    pub fn members(&self) -> BatchMembers<'_> {
        BatchMembers {
            entity_type: &self.entity_type,
            ids: self.ids.iter().map(String::as_str).collect(),
        }
    }
}

/// Membership test over the ids of one `TypedBatch`.
#[derive(Debug)]
pub struct BatchMembers<'a> {
    entity_type: &'a str,
    ids: HashSet<&'a str>,
}

impl BatchMembers<'_> {
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.entity_type == entity.entity_type && self.ids.contains(entity.id.as_str())
    }
}
