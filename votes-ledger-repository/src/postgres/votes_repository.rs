//! PostgreSQL implementation of the votes ledger repository.
//!
//! Provides a PostgreSQL backend for the `VotesRepository` trait with
//! connection pooling and per-key transactional mutations.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Row locking with `SELECT ... FOR UPDATE` around every vote mutation
//! - `ON CONFLICT DO NOTHING` inserts guarded by the unique vote key index
//! - Batched reads using `= ANY($n)` over one entity type at a time
//!
//! ## Database Tables
//!
//! - `votes`: one row per voter/votable pair, created by the embedded migrations
use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::debug;
use votes_ledger_shared::types::{
    Direction, EntityRef, LedgerChange, LedgerWrite, TypedBatch, Vote, VoteCommand, VoteFilter,
    VoteKey, VotesCount,
};
use crate::postgres::schema::{MIGRATOR, VOTES_TABLE};
use crate::{VotesRepository, VotesRepositoryError};

#[derive(Debug, FromRow)]
struct VoteRow {
    id: i64,
    voter_type: String,
    voter_id: String,
    votable_type: String,
    votable_id: String,
    direction: i16,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<VoteRow> for Vote {
    type Error = VotesRepositoryError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Vote {
            id: row.id,
            voter: EntityRef::new(row.voter_type, row.voter_id),
            votable: EntityRef::new(row.votable_type, row.votable_id),
            direction: Direction::try_from(row.direction)
                .map_err(|_| VotesRepositoryError::InvalidDirection(row.direction))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct VotesCountRow {
    votable_type: String,
    votable_id: String,
    upvotes: i64,
    downvotes: i64,
}

fn into_votes(rows: Vec<VoteRow>) -> Result<Vec<Vote>, VotesRepositoryError> {
    rows.into_iter().map(Vote::try_from).collect()
}

/// PostgreSQL implementation of the votes ledger repository.
pub struct PostgresVotesRepository {
    pool: sqlx::PgPool,
}

impl PostgresVotesRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresVotesRepository)` - Ready-to-use repository instance
    /// * `Err(VotesRepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, VotesRepositoryError> {
        Ok(Self { pool })
    }

    /// Number of connections currently held by the pool.
    pub fn pool_size(&self) -> u32 {
        self.pool.size()
    }

    /// Reads the vote stored for `key` and locks its row until the transaction ends.
    async fn lock_vote_tx(
        &self,
        key: &VoteKey,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<Vote>, VotesRepositoryError> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            FROM votes
            WHERE voter_type = $1 AND voter_id = $2 AND votable_type = $3 AND votable_id = $4
            FOR UPDATE
            "#,
        )
            .bind(&key.voter.entity_type)
            .bind(&key.voter.id)
            .bind(&key.votable.entity_type)
            .bind(&key.votable.id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(Vote::try_from).transpose()
    }

    /// Inserts a new vote unless another transaction inserted the same key first.
    ///
    /// Returns `None` when the insert lost that race.
    async fn insert_vote_tx(
        &self,
        key: &VoteKey,
        direction: Direction,
        at: OffsetDateTime,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<Vote>, VotesRepositoryError> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            INSERT INTO votes (voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (voter_type, voter_id, votable_type, votable_id) DO NOTHING
            RETURNING id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            "#,
        )
            .bind(&key.voter.entity_type)
            .bind(&key.voter.id)
            .bind(&key.votable.entity_type)
            .bind(&key.votable.id)
            .bind(direction.value())
            .bind(at)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(Vote::try_from).transpose()
    }

    async fn update_vote_tx(
        &self,
        id: i64,
        direction: Direction,
        at: OffsetDateTime,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vote, VotesRepositoryError> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            UPDATE votes SET direction = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            "#,
        )
            .bind(direction.value())
            .bind(at)
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;

        Vote::try_from(row)
    }

    async fn delete_vote_tx(
        &self,
        id: i64,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), VotesRepositoryError> {
        sqlx::query("DELETE FROM votes WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Performs the write planned for `current`.
    ///
    /// Returns `None` only when an insert lost a race against a concurrent
    /// insert of the same key; the caller re-reads and plans again.
    async fn write_planned_tx(
        &self,
        key: &VoteKey,
        command: VoteCommand,
        current: Option<Vote>,
        at: OffsetDateTime,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<LedgerChange>, VotesRepositoryError> {
        let change = match (command.plan(current.as_ref().map(|v| v.direction)), current) {
            (LedgerWrite::Keep, current) => LedgerChange::Unchanged(current),
            (LedgerWrite::Insert(direction), _) => {
                match self.insert_vote_tx(key, direction, at, tx).await? {
                    Some(vote) => LedgerChange::Created(vote),
                    None => return Ok(None),
                }
            }
            (LedgerWrite::Update(direction), Some(stored)) => LedgerChange::Updated {
                vote: self.update_vote_tx(stored.id, direction, at, tx).await?,
                previous: stored.direction,
            },
            (LedgerWrite::Delete, Some(stored)) => {
                self.delete_vote_tx(stored.id, tx).await?;
                LedgerChange::Deleted(stored)
            }
            (write, None) => {
                return Err(VotesRepositoryError::Conflict(format!(
                    "planned {write:?} without a stored vote for {} -> {}",
                    key.voter, key.votable
                )));
            }
        };
        Ok(Some(change))
    }
}

#[async_trait]
impl VotesRepository for PostgresVotesRepository {
    async fn ensure_schema(&self) -> Result<(), VotesRepositoryError> {
        MIGRATOR.run(&self.pool).await?;
        debug!(table = VOTES_TABLE, "Votes ledger schema ensured");
        Ok(())
    }

    async fn schema_exists(&self) -> Result<bool, VotesRepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(VOTES_TABLE)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Applies the command inside one transaction.
    ///
    /// The key's row is locked before planning. If no row exists, two writers
    /// may both plan an insert; the unique index lets exactly one succeed and
    /// the other re-reads the now-committed row under lock and plans again.
    async fn apply_command(
        &self,
        key: &VoteKey,
        command: VoteCommand,
        at: OffsetDateTime,
    ) -> Result<LedgerChange, VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = self.lock_vote_tx(key, &mut tx).await?;
        let change = match self.write_planned_tx(key, command, current, at, &mut tx).await? {
            Some(change) => change,
            None => {
                debug!(voter = %key.voter, votable = %key.votable, "Lost insert race, re-reading vote");
                let current = self.lock_vote_tx(key, &mut tx).await?;
                self.write_planned_tx(key, command, current, at, &mut tx)
                    .await?
                    .ok_or_else(|| {
                        VotesRepositoryError::Conflict(format!(
                            "vote {} -> {} changed concurrently",
                            key.voter, key.votable
                        ))
                    })?
            }
        };

        if change.is_write() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(change)
    }

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VotesRepositoryError> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            FROM votes
            WHERE voter_type = $1 AND voter_id = $2 AND votable_type = $3 AND votable_id = $4
            "#,
        )
            .bind(&key.voter.entity_type)
            .bind(&key.voter.id)
            .bind(&key.votable.entity_type)
            .bind(&key.votable.id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Vote::try_from).transpose()
    }

    async fn get_vote_counts(
        &self,
        votables: &TypedBatch,
    ) -> Result<Vec<VotesCount>, VotesRepositoryError> {
        if votables.ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, VotesCountRow>(
            r#"
            SELECT votable_type, votable_id,
                   COUNT(*) FILTER (WHERE direction = 1) AS upvotes,
                   COUNT(*) FILTER (WHERE direction = -1) AS downvotes
            FROM votes
            WHERE votable_type = $1 AND votable_id = ANY($2)
            GROUP BY votable_type, votable_id
            "#,
        )
            .bind(&votables.entity_type)
            .bind(&votables.ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| VotesCount {
                votable: EntityRef::new(row.votable_type, row.votable_id),
                upvotes: row.upvotes,
                downvotes: row.downvotes,
            })
            .collect())
    }

    async fn get_votes_for_votables(
        &self,
        votables: &TypedBatch,
        direction: Option<Direction>,
    ) -> Result<Vec<Vote>, VotesRepositoryError> {
        if votables.ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            FROM votes
            WHERE votable_type = $1 AND votable_id = ANY($2)
              AND ($3::smallint IS NULL OR direction = $3)
            ORDER BY id
            "#,
        )
            .bind(&votables.entity_type)
            .bind(&votables.ids)
            .bind(direction.map(Direction::value))
            .fetch_all(&self.pool)
            .await?;

        into_votes(rows)
    }

    async fn get_votes_by_voters(
        &self,
        voters: &TypedBatch,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>, VotesRepositoryError> {
        if voters.ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at
            FROM votes
            WHERE voter_type = $1 AND voter_id = ANY($2)
              AND ($3::text IS NULL OR votable_type = $3)
              AND ($4::smallint IS NULL OR direction = $4)
            ORDER BY id
            "#,
        )
            .bind(&voters.entity_type)
            .bind(&voters.ids)
            .bind(filter.votable_type.as_deref())
            .bind(filter.direction.map(Direction::value))
            .fetch_all(&self.pool)
            .await?;

        into_votes(rows)
    }
}
