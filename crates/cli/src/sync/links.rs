// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Link-resolution map between requirement ids and remote keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bidirectional requirement id ↔ remote key map.
///
/// Shared by every task of a phase; the engine wraps it in a mutex and never
/// holds the lock across a remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMap {
    by_req_id: BTreeMap<String, String>,
    by_remote_id: BTreeMap<String, String>,
}

impl LinkMap {
    pub fn new() -> Self {
        LinkMap::default()
    }

    /// Record that `req_id` lives at `remote_id`, replacing older entries for either side.
    pub fn insert(&mut self, req_id: impl Into<String>, remote_id: impl Into<String>) {
        let (req_id, remote_id) = (req_id.into(), remote_id.into());
        if let Some(old) = self.by_req_id.insert(req_id.clone(), remote_id.clone()) {
            self.by_remote_id.remove(&old);
        }
        if let Some(old) = self.by_remote_id.insert(remote_id, req_id.clone()) {
            if old != req_id {
                self.by_req_id.remove(&old);
            }
        }
    }

    /// Remote key for a link target.
    ///
    /// Targets may name a requirement id or already be a remote key.
    pub fn resolve(&self, target: &str) -> Option<String> {
        match self.by_req_id.get(target) {
            Some(remote_id) => Some(remote_id.clone()),
            None if self.by_remote_id.contains_key(target) => Some(target.to_string()),
            None => None,
        }
    }

    /// Requirement id stored at a remote key.
    pub fn req_id_for(&self, remote_id: &str) -> Option<&str> {
        self.by_remote_id.get(remote_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_req_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_req_id.is_empty()
    }
}

impl<R: Into<String>, K: Into<String>> FromIterator<(R, K)> for LinkMap {
    fn from_iter<I: IntoIterator<Item = (R, K)>>(iter: I) -> Self {
        let mut map = LinkMap::new();
        for (req_id, remote_id) in iter {
            map.insert(req_id, remote_id);
        }
        map
    }
}
