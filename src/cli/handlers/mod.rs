//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod ledger;
pub mod listen;
pub mod migrate;

pub use ledger::{LedgerCommandHandler, RecordArgs};
pub use listen::ListenCommandHandler;
pub use migrate::MigrateCommandHandler;
