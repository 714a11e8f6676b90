// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rq-core: Shared library for reqsync
//!
//! This crate provides the requirement entity, the requirement tree and the
//! rich-text markup translator used by the reqsync synchronization engine
//! and exchange transceiver. It performs no I/O.

pub mod error;
pub mod markup;
pub mod natural;
pub mod requirement;
pub mod summary;
pub mod tree;

pub use error::{Error, Result};
pub use requirement::{
    AttachmentHashes, Asil, Attribute, Category, CustomerStatus, InternalStatus, Requirement,
    Status, TestLevel,
};
pub use tree::{HierarchyNode, NodeId, ReqTree};
