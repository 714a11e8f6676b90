// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory remote for engine tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rq_core::HierarchyNode;

use super::remote::{
    FolderId, ParentRef, RawRecord, RecordFields, RemoteApi, RemoteError, RemoteFuture,
    RemoteLink, RemoteResult,
};
use crate::config::FilterConfig;

/// A mutating remote call that succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateRecord(RecordFields),
    UpdateRecord(String, RecordFields),
    CreateLink {
        link_type: String,
        from: String,
        to: String,
    },
    DeleteLink(String),
    CreateLabel(String),
    Upload {
        key: String,
        file: PathBuf,
        name: String,
    },
    Transition {
        key: String,
        state: String,
        via: Option<String>,
    },
    AddToFolder(FolderId, String),
    RemoveFromFolder(FolderId, String),
    AddChild(String, String),
    RemoveChild(String, String),
}

#[derive(Default)]
pub struct MockState {
    pub label_records: Vec<RawRecord>,
    pub filter_records: Vec<RawRecord>,
    /// Keys the folder query reports.
    pub folder_keys: Vec<String>,
    /// Records only reachable through `fetch_records`.
    pub stored: HashMap<String, RawRecord>,
    pub project_name: String,
    pub folders: HashMap<String, FolderId>,
    pub hierarchy: Vec<HierarchyNode>,
    pub parents: HashMap<String, ParentRef>,
    pub links: HashMap<String, Vec<RemoteLink>>,
    pub attachments: HashMap<String, Vec<String>>,
    pub labels: Vec<String>,
    /// Record keys (or requirement ids, for creation) whose writes fail.
    pub failing: HashSet<String>,
    pub fail_unlink: bool,
    pub queries: Vec<String>,
    pub calls: Vec<Call>,
    next_key: u32,
    next_link: u32,
}

/// Mock remote sharing its state with the test through an `Arc`.
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        let remote = MockRemote::default();
        remote.with(|s| {
            s.project_name = "Brake Project".to_string();
            s.next_key = 100;
        });
        remote
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn folder_id(&self, path: &str) -> Option<FolderId> {
        self.with(|s| s.folders.get(path).copied())
    }

    pub fn fail(&self, key: &str) {
        self.with(|s| s.failing.insert(key.to_string()));
    }

    pub fn add_link(&self, from: &str, id: &str, link_type: &str, to: &str, issue_type: &str) {
        self.with(|s| {
            s.links.entry(from.to_string()).or_default().push(RemoteLink {
                id: id.to_string(),
                link_type: link_type.to_string(),
                target_key: to.to_string(),
                target_issue_type: issue_type.to_string(),
            })
        });
    }

    /// Run `f` against the state after yielding once, so concurrent calls interleave.
    fn respond<T, F>(&self, f: F) -> RemoteFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut MockState) -> RemoteResult<T> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut guard = state.lock().unwrap();
            f(&mut guard)
        })
    }
}

fn check(state: &MockState, key: &str) -> RemoteResult<()> {
    if state.failing.contains(key) {
        Err(RemoteError::Rejected(format!("{} is locked", key)))
    } else {
        Ok(())
    }
}

impl RemoteApi for MockRemote {
    fn search_by_labels(
        &self,
        _project: &str,
        _grouping_labels: &[String],
        _labels: &[String],
    ) -> RemoteFuture<'_, Vec<RawRecord>> {
        self.respond(|s| Ok(s.label_records.clone()))
    }

    fn search_by_filter(&self, _filter: &FilterConfig) -> RemoteFuture<'_, Vec<RawRecord>> {
        self.respond(|s| Ok(s.filter_records.clone()))
    }

    fn search_keys(&self, query: &str) -> RemoteFuture<'_, Vec<String>> {
        let query = query.to_string();
        self.respond(move |s| {
            s.queries.push(query);
            Ok(s.folder_keys.clone())
        })
    }

    fn fetch_records(&self, keys: &[String]) -> RemoteFuture<'_, Vec<RawRecord>> {
        let keys = keys.to_vec();
        self.respond(move |s| {
            keys.iter()
                .map(|k| {
                    s.stored
                        .get(k)
                        .cloned()
                        .ok_or_else(|| RemoteError::NotFound(k.clone()))
                })
                .collect()
        })
    }

    fn project_name(&self, _project: &str) -> RemoteFuture<'_, String> {
        self.respond(|s| Ok(s.project_name.clone()))
    }

    fn get_or_create_folder(&self, _project: &str, path: &str) -> RemoteFuture<'_, FolderId> {
        let path = path.to_string();
        self.respond(move |s| {
            let next = 100 + s.folders.len() as FolderId;
            Ok(*s.folders.entry(path).or_insert(next))
        })
    }

    fn folder_hierarchy(
        &self,
        _project: &str,
        _folder: FolderId,
    ) -> RemoteFuture<'_, Vec<HierarchyNode>> {
        self.respond(|s| Ok(s.hierarchy.clone()))
    }

    fn parent_map(&self, _project: &str) -> RemoteFuture<'_, HashMap<String, ParentRef>> {
        self.respond(|s| Ok(s.parents.clone()))
    }

    fn record_links(&self, key: &str) -> RemoteFuture<'_, Vec<RemoteLink>> {
        let key = key.to_string();
        self.respond(move |s| Ok(s.links.get(&key).cloned().unwrap_or_default()))
    }

    fn record_attachments(&self, key: &str) -> RemoteFuture<'_, Vec<String>> {
        let key = key.to_string();
        self.respond(move |s| Ok(s.attachments.get(&key).cloned().unwrap_or_default()))
    }

    fn create_record(&self, fields: RecordFields) -> RemoteFuture<'_, String> {
        self.respond(move |s| {
            check(s, fields.requirement_id.as_deref().unwrap_or_default())?;
            let key = format!("PRJ-{}", s.next_key);
            s.next_key += 1;
            s.calls.push(Call::CreateRecord(fields));
            Ok(key)
        })
    }

    fn update_record(&self, key: &str, fields: RecordFields) -> RemoteFuture<'_, ()> {
        let key = key.to_string();
        self.respond(move |s| {
            check(s, &key)?;
            s.calls.push(Call::UpdateRecord(key, fields));
            Ok(())
        })
    }

    fn create_link(&self, link_type: &str, from: &str, to: &str) -> RemoteFuture<'_, ()> {
        let (link_type, from, to) = (link_type.to_string(), from.to_string(), to.to_string());
        self.respond(move |s| {
            check(s, &from)?;
            s.next_link += 1;
            let link = RemoteLink {
                id: format!("NEW-{}", s.next_link),
                link_type: "Requirement".to_string(),
                target_key: to.clone(),
                target_issue_type: "Functional Requirement".to_string(),
            };
            s.links.entry(from.clone()).or_default().push(link);
            s.calls.push(Call::CreateLink { link_type, from, to });
            Ok(())
        })
    }

    fn delete_link(&self, link_id: &str) -> RemoteFuture<'_, ()> {
        let link_id = link_id.to_string();
        self.respond(move |s| {
            for links in s.links.values_mut() {
                links.retain(|l| l.id != link_id);
            }
            s.calls.push(Call::DeleteLink(link_id));
            Ok(())
        })
    }

    fn list_labels(&self, _project: &str) -> RemoteFuture<'_, Vec<String>> {
        self.respond(|s| Ok(s.labels.clone()))
    }

    fn create_label(&self, _project: &str, name: &str) -> RemoteFuture<'_, ()> {
        let name = name.to_string();
        self.respond(move |s| {
            check(s, &name)?;
            s.labels.push(name.clone());
            s.calls.push(Call::CreateLabel(name));
            Ok(())
        })
    }

    fn upload_attachment(&self, key: &str, file: &Path, name: &str) -> RemoteFuture<'_, ()> {
        let (key, file, name) = (key.to_string(), file.to_path_buf(), name.to_string());
        self.respond(move |s| {
            check(s, &key)?;
            s.attachments.entry(key.clone()).or_default().push(name.clone());
            s.calls.push(Call::Upload { key, file, name });
            Ok(())
        })
    }

    fn transition(&self, key: &str, state: &str, via: Option<&str>) -> RemoteFuture<'_, ()> {
        let (key, state, via) = (key.to_string(), state.to_string(), via.map(String::from));
        self.respond(move |s| {
            check(s, &key)?;
            s.calls.push(Call::Transition { key, state, via });
            Ok(())
        })
    }

    fn add_to_folder(&self, _project: &str, folder: FolderId, key: &str) -> RemoteFuture<'_, ()> {
        let key = key.to_string();
        self.respond(move |s| {
            check(s, &key)?;
            s.parents.insert(key.clone(), ParentRef::Folder(folder));
            s.calls.push(Call::AddToFolder(folder, key));
            Ok(())
        })
    }

    fn remove_from_folder(
        &self,
        _project: &str,
        folder: FolderId,
        key: &str,
    ) -> RemoteFuture<'_, ()> {
        let key = key.to_string();
        self.respond(move |s| {
            if s.fail_unlink {
                return Err(RemoteError::ConnectionFailed("reset by peer".to_string()));
            }
            s.parents.remove(&key);
            s.calls.push(Call::RemoveFromFolder(folder, key));
            Ok(())
        })
    }

    fn add_child(&self, _project: &str, parent: &str, child: &str) -> RemoteFuture<'_, ()> {
        let (parent, child) = (parent.to_string(), child.to_string());
        self.respond(move |s| {
            check(s, &child)?;
            s.parents
                .insert(child.clone(), ParentRef::Record(parent.clone()));
            s.calls.push(Call::AddChild(parent, child));
            Ok(())
        })
    }

    fn remove_child(&self, _project: &str, parent: &str, child: &str) -> RemoteFuture<'_, ()> {
        let (parent, child) = (parent.to_string(), child.to_string());
        self.respond(move |s| {
            if s.fail_unlink {
                return Err(RemoteError::ConnectionFailed("reset by peer".to_string()));
            }
            s.parents.remove(&child);
            s.calls.push(Call::RemoveChild(parent, child));
            Ok(())
        })
    }
}
