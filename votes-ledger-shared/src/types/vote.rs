use crate::errors::InvalidDirection;
use crate::types::{EntityRef, VoteKey};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Represents the direction of a vote cast by a voter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Indicates an upvote, stored as `+1`.
    Up,
    /// Indicates a downvote, stored as `-1`.
    Down,
}

impl Direction {
    pub fn value(self) -> i16 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = InvalidDirection;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Up),
            -1 => Ok(Direction::Down),
            other => Err(InvalidDirection(other)),
        }
    }
}

impl TryFrom<i16> for Direction {
    type Error = InvalidDirection;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Direction::try_from(i64::from(value))
    }
}

/// A single ledger entry: one voter's current vote on one votable.
///
/// `id` is assigned by the store's sequence on insert. It defines creation
/// order; the timestamps come from the writer's clock and may be skewed
/// between processes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub voter: EntityRef,
    pub votable: EntityRef,
    pub direction: Direction,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Vote {
    pub fn key(&self) -> VoteKey {
        VoteKey::new(self.voter.clone(), self.votable.clone())
    }

    pub fn is_up(&self) -> bool {
        self.direction == Direction::Up
    }

    pub fn is_down(&self) -> bool {
        self.direction == Direction::Down
    }

    /// Ordering used by every relation listing: oldest vote first.
    pub fn creation_order(&self) -> i64 {
        self.id
    }
}

/// Narrows the votes returned by relation queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteFilter {
    /// Only votes on votables of this type.
    pub votable_type: Option<String>,
    /// Only votes in this direction.
    pub direction: Option<Direction>,
}

impl VoteFilter {
    pub fn of_type(votable_type: impl Into<String>) -> Self {
        Self {
            votable_type: Some(votable_type.into()),
            direction: None,
        }
    }

    pub fn direction(direction: Direction) -> Self {
        Self {
            votable_type: None,
            direction: Some(direction),
        }
    }

    pub fn matches(&self, vote: &Vote) -> bool {
        self.votable_type
            .as_deref()
            .is_none_or(|t| t == vote.votable.entity_type)
            && self.direction.is_none_or(|d| d == vote.direction)
    }
}
