// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote ticket-system abstraction.
//!
//! Provides a trait-based seam over the remote API so that:
//! - a real HTTP client can be plugged in by the embedding application
//! - mock remotes drive the engine in unit tests

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use rq_core::HierarchyNode;
use serde::{Deserialize, Serialize};

use crate::config::FilterConfig;

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote refused the request.
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// The referenced record, folder or link does not exist.
    #[error("not found on remote: {0}")]
    NotFound(String),

    /// The request never reached the remote or the connection broke.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote answered with something the client could not decode.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by every [`RemoteApi`] method.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Numeric id of a folder in the remote requirement tree.
pub type FolderId = u64;

/// Where a record currently sits in the remote folder structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    Folder(FolderId),
    Record(String),
}

/// One outward link as reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLink {
    pub id: String,
    /// Link type name ("Requirement" for requirement-to-requirement links).
    pub link_type: String,
    pub target_key: String,
    pub target_issue_type: String,
}

/// Field set of a remote record. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub project: Option<String>,
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub requirement_id: Option<String>,
    /// Workflow state name. Read only; changed through [`RemoteApi::transition`].
    pub status: Option<String>,
    pub customer_status: Option<String>,
    pub asil: Option<String>,
    pub satisfies: Option<String>,
    pub review_comments: Option<String>,
    pub customer_comments: Option<String>,
    pub internal_comments: Option<String>,
    pub test_levels: Option<Vec<String>>,
    /// Prefixed grouping labels (the remote's "components").
    pub grouping_labels: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub fix_versions: Option<Vec<String>>,
    /// Outward links. Read only; changed through the link methods.
    pub links: Option<Vec<RemoteLink>>,
}

/// A record as returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub key: String,
    pub fields: RecordFields,
}

impl RawRecord {
    pub fn new(key: impl Into<String>, fields: RecordFields) -> Self {
        RawRecord {
            key: key.into(),
            fields,
        }
    }
}

/// Remote ticket-system API used by the sync engine.
///
/// Implementations copy any borrowed arguments they need before returning
/// the future, so futures only borrow `self`.
pub trait RemoteApi: Send + Sync {
    /// Records of `project` carrying every grouping label and label given.
    fn search_by_labels(
        &self,
        project: &str,
        grouping_labels: &[String],
        labels: &[String],
    ) -> RemoteFuture<'_, Vec<RawRecord>>;

    /// Records matched by a saved filter.
    fn search_by_filter(&self, filter: &FilterConfig) -> RemoteFuture<'_, Vec<RawRecord>>;

    /// Keys matched by a raw query.
    fn search_keys(&self, query: &str) -> RemoteFuture<'_, Vec<String>>;

    /// Full records for the given keys.
    fn fetch_records(&self, keys: &[String]) -> RemoteFuture<'_, Vec<RawRecord>>;

    /// Display name of a project.
    fn project_name(&self, project: &str) -> RemoteFuture<'_, String>;

    /// Id of the folder at `path`, creating missing folders on the way.
    fn get_or_create_folder(&self, project: &str, path: &str) -> RemoteFuture<'_, FolderId>;

    /// Record hierarchy below a folder.
    fn folder_hierarchy(
        &self,
        project: &str,
        folder: FolderId,
    ) -> RemoteFuture<'_, Vec<HierarchyNode>>;

    /// Current parent of every record in the project, keyed by record key.
    fn parent_map(&self, project: &str) -> RemoteFuture<'_, HashMap<String, ParentRef>>;

    fn record_links(&self, key: &str) -> RemoteFuture<'_, Vec<RemoteLink>>;

    /// File names of the attachments of a record.
    fn record_attachments(&self, key: &str) -> RemoteFuture<'_, Vec<String>>;

    /// Create a record and return its key.
    fn create_record(&self, fields: RecordFields) -> RemoteFuture<'_, String>;

    fn update_record(&self, key: &str, fields: RecordFields) -> RemoteFuture<'_, ()>;

    fn create_link(&self, link_type: &str, from: &str, to: &str) -> RemoteFuture<'_, ()>;

    fn delete_link(&self, link_id: &str) -> RemoteFuture<'_, ()>;

    /// Grouping labels known to the project.
    fn list_labels(&self, project: &str) -> RemoteFuture<'_, Vec<String>>;

    fn create_label(&self, project: &str, name: &str) -> RemoteFuture<'_, ()>;

    fn upload_attachment(&self, key: &str, file: &Path, name: &str) -> RemoteFuture<'_, ()>;

    /// Move a record to `state`, optionally through a named transition.
    fn transition(&self, key: &str, state: &str, via: Option<&str>) -> RemoteFuture<'_, ()>;

    fn add_to_folder(&self, project: &str, folder: FolderId, key: &str) -> RemoteFuture<'_, ()>;

    fn remove_from_folder(
        &self,
        project: &str,
        folder: FolderId,
        key: &str,
    ) -> RemoteFuture<'_, ()>;

    fn add_child(&self, project: &str, parent: &str, child: &str) -> RemoteFuture<'_, ()>;

    fn remove_child(&self, project: &str, parent: &str, child: &str) -> RemoteFuture<'_, ()>;
}
