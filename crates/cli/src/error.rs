// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// All possible errors that can occur in the rqsync library.
///
/// Structural errors abort a read or write outright; per-record remote
/// failures arrive wrapped in [`SyncError`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] rq_core::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("template not found: {}\n  hint: check `exchange.template` in the configuration", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("unknown attribute type '{kind}' on spec object {object}")]
    UnknownAttributeType { object: String, kind: String },

    #[error("document references undefined {what} '{reference}'")]
    UnknownDefinition { what: &'static str, reference: String },

    #[error("enum value '{value}' is not defined for datatype {datatype}")]
    EnumValueUndefined { value: String, datatype: String },

    #[error("no spec object found for requirement {0}")]
    SpecObjectNotFound(String),

    #[error("document has no specification")]
    NoSpecification,

    #[error("unknown markup dialect '{0}'\n  hint: valid dialects are: remote, canonical, exchange")]
    UnknownDialect(String),
}

/// A specialized Result type for rqsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
