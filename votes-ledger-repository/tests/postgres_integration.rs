//! Integration tests for the PostgreSQL votes repository implementation.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup. Each test database is
//! migrated with `src/postgres/migrations` before the test body runs.
//!
//! They run whenever `DATABASE_URL` is set at build time and are ignored
//! otherwise: `DATABASE_URL=postgres://... cargo test --test postgres_integration`

use std::sync::Arc;
use sqlx::Row;
use time::OffsetDateTime;
use votes_ledger_repository::{PostgresVotesRepository, VotesRepository, VotesRepositoryError};
use votes_ledger_shared::types::{
    Direction, EntityRef, LedgerChange, TypedBatch, VoteCommand, VoteFilter, VoteKey,
};

fn user(id: u32) -> EntityRef {
    EntityRef::new("user", id)
}

fn idea(id: u32) -> EntityRef {
    EntityRef::new("idea", id)
}

fn at(seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_755_182_913 + seconds).unwrap()
}

async fn make_repository(pool: &sqlx::PgPool) -> PostgresVotesRepository {
    PostgresVotesRepository::new(pool.clone()).await.unwrap()
}

async fn count_rows(pool: &sqlx::PgPool) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM votes")
        .fetch_one(pool)
        .await
        .unwrap()
        .get::<i64, _>("n")
}

// ============================================================================
// Schema Tests
// ============================================================================

#[sqlx::test(migrations = false)]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_ensure_schema_is_idempotent(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone()).await.unwrap();
    assert!(!repository.schema_exists().await.unwrap());

    repository.ensure_schema().await.unwrap();
    repository.ensure_schema().await.unwrap();

    assert!(repository.schema_exists().await.unwrap());
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_ensure_schema_after_migrations(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    assert!(repository.schema_exists().await.unwrap());

    repository.ensure_schema().await.unwrap();

    assert_eq!(count_rows(&pool).await, 0);
}

// ============================================================================
// Vote Mutation Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_cast_flip_cancel(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    let key = VoteKey::new(user(1), idea(1));

    let created = repository.apply_command(&key, VoteCommand::Cast(Direction::Up), at(0)).await.unwrap();
    assert!(matches!(created, LedgerChange::Created(ref v) if v.direction == Direction::Up));

    let row = sqlx::query("SELECT direction FROM votes").fetch_one(&pool).await.unwrap();
    assert_eq!(row.get::<i16, _>("direction"), 1);

    let updated = repository.apply_command(&key, VoteCommand::Cast(Direction::Down), at(1)).await.unwrap();
    match updated {
        LedgerChange::Updated { vote, previous } => {
            assert_eq!(previous, Direction::Up);
            assert_eq!(vote.direction, Direction::Down);
            assert_eq!(vote.created_at, at(0));
            assert_eq!(vote.updated_at, at(1));
        }
        other => panic!("Expected update, got {other:?}"),
    }
    assert_eq!(count_rows(&pool).await, 1);

    let deleted = repository.apply_command(&key, VoteCommand::Cancel, at(2)).await.unwrap();
    assert!(matches!(deleted, LedgerChange::Deleted(_)));
    assert_eq!(count_rows(&pool).await, 0);

    let missing = repository.apply_command(&key, VoteCommand::Cancel, at(3)).await.unwrap();
    assert_eq!(missing, LedgerChange::Unchanged(None));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_same_direction_does_not_touch_row(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    let key = VoteKey::new(user(1), idea(1));

    repository.apply_command(&key, VoteCommand::Cast(Direction::Up), at(0)).await.unwrap();
    let again = repository.apply_command(&key, VoteCommand::Cast(Direction::Up), at(10)).await.unwrap();

    assert!(!again.is_write());
    let stored = repository.find_vote(&key).await.unwrap().unwrap();
    assert_eq!(stored.updated_at, at(0));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_concurrent_casts_keep_unique_key(pool: sqlx::PgPool) {
    let repository = Arc::new(make_repository(&pool).await);
    let key = VoteKey::new(user(1), idea(1));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repository = repository.clone();
            let key = key.clone();
            let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
            tokio::spawn(async move {
                repository.apply_command(&key, VoteCommand::Cast(direction), at(i)).await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if let LedgerChange::Created(_) = handle.await.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(count_rows(&pool).await, 1);
}

// ============================================================================
// Batched Read Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_vote_counts_per_votable(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    for (voter, direction) in [(1, Direction::Up), (2, Direction::Up), (3, Direction::Up), (4, Direction::Down)] {
        repository
            .apply_command(&VoteKey::new(user(voter), idea(1)), VoteCommand::Cast(direction), at(voter as i64))
            .await
            .unwrap();
    }

    let batch = TypedBatch::group(&[idea(1), idea(2)]).remove(0);
    let counts = repository.get_vote_counts(&batch).await.unwrap();

    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].votable, idea(1));
    assert_eq!(counts[0].upvotes, 3);
    assert_eq!(counts[0].downvotes, 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_votes_for_votables_in_creation_order(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    for (voter, second) in [(2, 0), (3, 1), (1, 2), (4, 3)] {
        repository
            .apply_command(&VoteKey::new(user(voter), idea(1)), VoteCommand::Cast(Direction::Up), at(second))
            .await
            .unwrap();
    }

    let batch = TypedBatch::group(&[idea(1)]).remove(0);
    let votes = repository.get_votes_for_votables(&batch, None).await.unwrap();
    let voters: Vec<_> = votes.iter().map(|v| v.voter.id.as_str()).collect();
    assert_eq!(voters, vec!["2", "3", "1", "4"]);

    let downs = repository.get_votes_for_votables(&batch, Some(Direction::Down)).await.unwrap();
    assert!(downs.is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_listing_order_ignores_skewed_clocks(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    // Writers with clocks running behind stamp later votes with earlier times.
    for (voter, second) in [(1, 60), (2, 30), (3, 0)] {
        repository
            .apply_command(&VoteKey::new(user(voter), idea(1)), VoteCommand::Cast(Direction::Up), at(second))
            .await
            .unwrap();
    }

    let votes = repository
        .get_votes_for_votables(&TypedBatch::single(&idea(1)), None)
        .await
        .unwrap();
    let voters: Vec<_> = votes.iter().map(|v| v.voter.id.as_str()).collect();
    assert_eq!(voters, vec!["1", "2", "3"]);

    let cast = repository
        .get_votes_by_voters(&TypedBatch::group(&[user(3), user(1)]).remove(0), &VoteFilter::default())
        .await
        .unwrap();
    let voters: Vec<_> = cast.iter().map(|v| v.voter.id.as_str()).collect();
    assert_eq!(voters, vec!["1", "3"]);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_votes_by_voters_with_filter(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    let targets = [idea(1), idea(2), EntityRef::new("feature", 1), EntityRef::new("feature", 2)];
    for (i, target) in targets.iter().enumerate() {
        repository
            .apply_command(&VoteKey::new(user(1), target.clone()), VoteCommand::Cast(Direction::Up), at(i as i64))
            .await
            .unwrap();
    }

    let batch = TypedBatch::group(&[user(1)]).remove(0);

    let all = repository.get_votes_by_voters(&batch, &VoteFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);

    let ideas = repository.get_votes_by_voters(&batch, &VoteFilter::of_type("idea")).await.unwrap();
    assert_eq!(ideas.len(), 2);
    assert!(ideas.iter().all(|v| v.votable.entity_type == "idea"));

    let downs = repository
        .get_votes_by_voters(&batch, &VoteFilter::direction(Direction::Down))
        .await
        .unwrap();
    assert!(downs.is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[cfg_attr(not(postgres_available), ignore = "requires DATABASE_URL")]
async fn test_corrupt_direction_is_reported(pool: sqlx::PgPool) {
    let repository = make_repository(&pool).await;
    sqlx::query("ALTER TABLE votes DROP CONSTRAINT votes_direction_check")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO votes (voter_type, voter_id, votable_type, votable_id, direction, created_at, updated_at) VALUES ('user', '1', 'idea', '1', 5, now(), now())",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = repository.find_vote(&VoteKey::new(user(1), idea(1))).await;
    assert!(matches!(result, Err(VotesRepositoryError::InvalidDirection(5))));
}
