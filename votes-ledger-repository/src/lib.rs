//! # Votes Ledger Repository
//! This crate provides the storage layer of the votes ledger: the
//! `VotesRepository` trait, a PostgreSQL implementation and an in-process
//! implementation suited for embedding and tests.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::VotesRepositoryError;
pub use interfaces::VotesRepository;
pub use memory::InMemoryVotesRepository;
pub use postgres::PostgresVotesRepository;
