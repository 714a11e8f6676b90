// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::convert::Dialect;

#[derive(Parser)]
#[command(name = "reqsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synchronize requirement trees between ticket systems and exchange documents")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate rich text between markup dialects
    #[command(after_help = "\
Examples:
  echo '*bold* text' | reqsync convert --from remote --to canonical
  reqsync convert --from exchange --to remote fragment.xhtml")]
    Convert {
        /// Dialect of the input (remote, canonical, exchange)
        #[arg(long, value_name = "DIALECT")]
        from: Dialect,

        /// Dialect of the output (remote, canonical, exchange)
        #[arg(long, value_name = "DIALECT")]
        to: Dialect,

        /// Input file (reads stdin when absent)
        file: Option<PathBuf>,
    },

    /// Print the requirement hierarchy of an exchange document
    Tree {
        /// Exchange document (JSON)
        document: PathBuf,

        /// Configuration file (default: ./reqsync.toml when present)
        #[arg(long, short, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}
