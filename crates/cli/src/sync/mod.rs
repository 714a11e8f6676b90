// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote synchronization module.
//!
//! Reads a requirement folder of a remote ticket system into a tree and
//! writes tree changes back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   ReqTree   │────►│ SyncEngine  │────►│  RemoteApi  │
//! │ (rq-core)   │◄────│  (phases)   │◄────│   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │   LinkMap   │  (req id ↔ remote key)
//!                     └─────────────┘
//! ```
//!
//! # Features
//!
//! - Read by grouping labels or saved filter, optionally unioned with the folder
//! - Phased write pass with per-phase concurrent fan-out
//! - Per-record failure reports that never abort sibling tasks
//! - Injectable remote trait for testing

mod engine;
pub mod fields;
mod links;
mod remote;

pub use engine::{SyncEngine, SyncError, SyncPhase, SyncResult, TaskFailure};
pub use links::LinkMap;
pub use remote::{
    FolderId, ParentRef, RawRecord, RecordFields, RemoteApi, RemoteError, RemoteFuture,
    RemoteLink, RemoteResult,
};

#[cfg(test)]
mod mock_remote;
