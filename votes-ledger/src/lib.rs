//! Votes Ledger Service Library
//!
//! Reads the service configuration, connects to PostgreSQL and wires the
//! vote ledger components on top of the PostgreSQL store.

pub mod config;
pub mod errors;

pub use config::{ConnectionMode, Dependencies, LedgerConfig};
pub use errors::LedgerError;
