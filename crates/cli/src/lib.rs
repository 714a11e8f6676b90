// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rqsync - Requirement synchronization between ticket systems and exchange
//! documents.
//!
//! This crate provides the I/O side of reqsync on top of the `rq-core`
//! requirement model.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - Reads a requirement folder from a remote ticket
//!   system and writes tree changes back in phases
//! - [`exchange::ExchangeTransceiver`] - Reads and writes exchange documents
//! - [`Config`] - `reqsync.toml` settings for both sides
//! - [`Error`] - Error types for all operations
//!
//! # Reading an exchange document
//!
//! ```rust,ignore
//! use rqsync::exchange::{ExchangeTransceiver, JsonFileStore};
//! use rqsync::Config;
//!
//! let config = Config::load_or_default(None)?;
//! let transceiver = ExchangeTransceiver::open(JsonFileStore::new("spec.json"), config.exchange)?;
//! let tree = transceiver.read()?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod error;
pub mod exchange;
pub mod sync;

pub use cli::{Cli, Command};
pub use commands::convert::Dialect;
pub use config::Config;
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Convert { from, to, file } => commands::convert::run(from, to, file),
        Command::Tree { document, config } => commands::tree::run(document, config),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
