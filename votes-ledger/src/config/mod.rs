//! Configuration module for the votes ledger service.
//! Defines the environment-driven settings and the dependency wiring.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{ConnectionMode, LedgerConfig};
