//! Ledger schema, managed through the embedded sqlx migrations.
use sqlx::migrate::Migrator;

/// Migrations under `src/postgres/migrations`, embedded at compile time.
pub(crate) static MIGRATOR: Migrator = sqlx::migrate!("src/postgres/migrations");

/// Table holding the ledger.
pub(crate) const VOTES_TABLE: &str = "votes";
