// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read and write passes between a requirement tree and the remote.
//!
//! The write pass runs its phases in a fixed order: create, update,
//! attachments, transition, link, move. Each phase finishes every task it
//! dispatched before the next one starts, since later phases need the keys
//! produced by earlier ones. Failed tasks do not stop their siblings; the
//! phase then reports all failures at once and the pass stops.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use rq_core::{Attribute, Category, InternalStatus, NodeId, ReqTree, Requirement, Status};
use tracing::{debug, info, warn};

use super::fields::{
    parse_allowlist, raw_to_req, req_to_fields, select_fields, DONE_STATE,
    REQUIREMENT_LINK_TYPE,
};
use super::links::LinkMap;
use super::remote::{FolderId, ParentRef, RecordFields, RemoteApi, RemoteError};
use crate::config::RemoteConfig;

/// Write-pass phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Create,
    Update,
    Attachments,
    Transition,
    Link,
    Move,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Create => "create",
            SyncPhase::Update => "update",
            SyncPhase::Attachments => "attachments",
            SyncPhase::Transition => "transition",
            SyncPhase::Link => "link",
            SyncPhase::Move => "move",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed task of a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub req_id: String,
    pub reason: String,
}

impl TaskFailure {
    fn new(req_id: &str, error: &SyncError) -> Self {
        TaskFailure {
            req_id: req_id.to_string(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.req_id, self.reason)
    }
}

/// Error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Core(#[from] rq_core::Error),

    /// At least one task of a phase failed. Successful tasks were applied.
    #[error("{phase} phase failed for {count} record(s):\n{report}", count = .failures.len(), report = render_failures(.failures))]
    Phase {
        phase: SyncPhase,
        failures: Vec<TaskFailure>,
    },

    #[error("requirement {0} has no remote id")]
    MissingRemoteId(String),
}

fn render_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(TaskFailure::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

struct Task<F> {
    node: NodeId,
    req_id: String,
    work: F,
}

impl<F> Task<F> {
    fn new(node: NodeId, req: &Requirement, work: F) -> Self {
        Task {
            node,
            req_id: req.req_id.clone(),
            work,
        }
    }
}

/// Run every task of a phase concurrently and wait for all of them.
async fn fan_out<T, F>(phase: SyncPhase, tasks: Vec<Task<F>>) -> (Vec<(NodeId, T)>, Vec<TaskFailure>)
where
    F: Future<Output = SyncResult<T>>,
{
    if tasks.is_empty() {
        debug!(%phase, "no eligible records, skipping phase");
        return (Vec::new(), Vec::new());
    }
    info!(%phase, tasks = tasks.len(), "starting phase");

    let (meta, work): (Vec<_>, Vec<_>) = tasks
        .into_iter()
        .map(|task| ((task.node, task.req_id), task.work))
        .unzip();
    let results = join_all(work).await;

    let mut done = Vec::new();
    let mut failures = Vec::new();
    for ((node, req_id), result) in meta.into_iter().zip(results) {
        match result {
            Ok(value) => done.push((node, value)),
            Err(e) => {
                warn!(%phase, req_id = %req_id, error = %e, "task failed");
                failures.push(TaskFailure::new(&req_id, &e));
            }
        }
    }
    (done, failures)
}

fn phase_result(phase: SyncPhase, failures: Vec<TaskFailure>) -> SyncResult<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Phase { phase, failures })
    }
}

fn require_key(req_id: &str, remote_id: Option<&str>) -> SyncResult<String> {
    remote_id
        .map(String::from)
        .ok_or_else(|| SyncError::MissingRemoteId(req_id.to_string()))
}

fn is_requirement_link(link_type: &str, target_issue_type: &str) -> bool {
    link_type == REQUIREMENT_LINK_TYPE && Category::from_str(target_issue_type).is_ok()
}

/// Workflow state and transition name for a status.
fn transition_target(status: Status) -> (&'static str, Option<&'static str>) {
    match status {
        Status::Accepted => (DONE_STATE, Some("Accept Issue")),
        Status::Rejected => (DONE_STATE, Some("Reject Issue")),
        other => (other.as_str(), None),
    }
}

fn needs_move(req: &Requirement) -> bool {
    req.has(InternalStatus::Moved) || req.has(InternalStatus::Created) || req.has(InternalStatus::Deleted)
}

/// Synchronizes a requirement tree with one remote folder.
pub struct SyncEngine<R> {
    remote: R,
    config: RemoteConfig,
    allowlist: Option<BTreeSet<Attribute>>,
    folder: Option<FolderId>,
    deleted_folder: FolderId,
    links: Mutex<LinkMap>,
    known_labels: Mutex<BTreeSet<String>>,
    /// Remote location of every record as of the last pass.
    parents: HashMap<String, ParentRef>,
}

impl<R: RemoteApi> SyncEngine<R> {
    /// Connect with an empty link map.
    pub async fn connect(remote: R, config: RemoteConfig) -> SyncResult<Self> {
        Self::connect_with_links(remote, config, LinkMap::new()).await
    }

    /// Connect, loading the known grouping labels, the parent cache and the
    /// deleted folder.
    pub async fn connect_with_links(
        remote: R,
        config: RemoteConfig,
        links: LinkMap,
    ) -> SyncResult<Self> {
        let allowlist = config
            .updated_attributes
            .as_deref()
            .map(parse_allowlist)
            .transpose()?;

        let known_labels: BTreeSet<String> =
            remote.list_labels(&config.project).await?.into_iter().collect();
        let parents = remote.parent_map(&config.project).await?;
        let deleted_folder = remote
            .get_or_create_folder(&config.project, &config.deleted_folder)
            .await?;
        debug!(
            project = %config.project,
            labels = known_labels.len(),
            records = parents.len(),
            deleted_folder,
            "connected to remote"
        );

        Ok(SyncEngine {
            remote,
            config,
            allowlist,
            folder: None,
            deleted_folder,
            links: Mutex::new(links),
            known_labels: Mutex::new(known_labels),
            parents,
        })
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Snapshot of the link-resolution map.
    pub fn link_map(&self) -> LinkMap {
        self.lock_links().clone()
    }

    /// Record the remote key of every requirement of `tree` that has one.
    pub fn register_links(&self, tree: &ReqTree) {
        let mut links = self.lock_links();
        for (_, req) in tree.iter() {
            if let Some(key) = &req.remote_id {
                links.insert(req.req_id.as_str(), key.as_str());
            }
        }
    }

    fn lock_links(&self) -> MutexGuard<'_, LinkMap> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_labels(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.known_labels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn folder(&mut self) -> SyncResult<FolderId> {
        if let Some(folder) = self.folder {
            return Ok(folder);
        }
        let folder = self
            .remote
            .get_or_create_folder(&self.config.project, &self.config.req_path)
            .await?;
        self.folder = Some(folder);
        Ok(folder)
    }

    /// Read the remote folder into a tree.
    ///
    /// Records come from the saved filter if one is configured, otherwise
    /// from the grouping-label search. Any remote failure aborts the read.
    pub async fn read(&mut self) -> SyncResult<ReqTree> {
        let folder = self.folder().await?;
        let project = self.config.project.as_str();

        let mut records = match &self.config.filter {
            Some(filter) => self.remote.search_by_filter(filter).await?,
            None => {
                self.remote
                    .search_by_labels(project, &self.config.components, &self.config.labels)
                    .await?
            }
        };

        if self.config.read_from_folder {
            let name = self.remote.project_name(project).await?;
            let query = format!(
                "issue in requirementsPath(\"{}/{}\")",
                name, self.config.req_path
            );
            let found: HashSet<String> = records.iter().map(|r| r.key.clone()).collect();
            let missing: Vec<String> = self
                .remote
                .search_keys(&query)
                .await?
                .into_iter()
                .filter(|key| !found.contains(key))
                .collect();
            if !missing.is_empty() {
                debug!(count = missing.len(), "fetching records found only in folder");
                records.extend(self.remote.fetch_records(&missing).await?);
            }
        }
        info!(records = records.len(), "read remote records");

        let converted: Vec<(String, Requirement)> = {
            let mut links = self.lock_links();
            for raw in &records {
                if let Some(req_id) = raw.fields.requirement_id.as_deref().filter(|id| !id.is_empty()) {
                    links.insert(req_id, raw.key.as_str());
                }
            }
            records
                .iter()
                .map(|raw| (raw.key.clone(), raw_to_req(raw, &links, &self.config)))
                .collect()
        };

        let hierarchy = self.remote.folder_hierarchy(project, folder).await?;
        Ok(ReqTree::build(converted, &hierarchy)?)
    }

    /// Push every pending change of `tree` to the remote.
    ///
    /// On success all lifecycle flags are cleared and the parent cache is
    /// refreshed. On a phase failure the successful tasks of that phase stay
    /// applied and the remaining phases do not run.
    pub async fn write(&mut self, tree: &mut ReqTree) -> SyncResult<()> {
        let folder = self.folder().await?;

        self.create_phase(tree).await?;
        self.update_phase(tree).await?;
        self.attachment_phase(tree).await?;
        self.transition_phase(tree).await?;
        self.link_phase(tree).await?;
        self.move_phase(tree, folder).await?;

        tree.clear_sync_state();
        self.parents = self.remote.parent_map(&self.config.project).await?;
        info!("write pass complete");
        Ok(())
    }

    /// Create the grouping labels the remote does not know yet.
    ///
    /// Returns the labels whose creation failed.
    async fn ensure_labels(&self, wanted: BTreeSet<String>) -> HashMap<String, RemoteError> {
        let missing: Vec<String> = {
            let known = self.lock_labels();
            wanted.into_iter().filter(|l| !known.contains(l)).collect()
        };

        let mut failed = HashMap::new();
        for label in missing {
            debug!(label = %label, "creating grouping label");
            match self.remote.create_label(&self.config.project, &label).await {
                Ok(()) => {
                    self.lock_labels().insert(label);
                }
                Err(e) => {
                    failed.insert(label, e);
                }
            }
        }
        failed
    }

    /// Record fields for `req`, or the label failure blocking it.
    fn prepare_fields(
        &self,
        req: &Requirement,
        failed_labels: &HashMap<String, RemoteError>,
    ) -> SyncResult<RecordFields> {
        let mut fields = req_to_fields(req, &self.config);
        if let Some(allowed) = &self.allowlist {
            if !req.has(InternalStatus::Created) {
                fields = select_fields(fields, allowed);
            }
        }
        let blocked = fields
            .grouping_labels
            .iter()
            .flatten()
            .find_map(|label| failed_labels.get(label));
        match blocked {
            Some(e) => Err(e.clone().into()),
            None => Ok(fields),
        }
    }

    fn wanted_labels(&self, reqs: &[&Requirement]) -> BTreeSet<String> {
        reqs.iter()
            .filter_map(|req| {
                let fields = req_to_fields(req, &self.config);
                match &self.allowlist {
                    Some(allowed) if !req.has(InternalStatus::Created) => {
                        select_fields(fields, allowed).grouping_labels
                    }
                    _ => fields.grouping_labels,
                }
            })
            .flatten()
            .collect()
    }

    /// Post CREATED records that have no remote key yet.
    ///
    /// A record keeping its key from an earlier, partly failed write is only
    /// registered in the link map.
    async fn create_phase(&self, tree: &mut ReqTree) -> SyncResult<()> {
        let mut eligible: Vec<(NodeId, &Requirement)> = Vec::new();
        for (id, req) in tree.iter().filter(|(_, req)| req.has(InternalStatus::Created)) {
            match &req.remote_id {
                Some(key) => {
                    debug!(req_id = %req.req_id, key = %key, "record already created, skipping");
                    self.lock_links().insert(req.req_id.as_str(), key.as_str());
                }
                None => eligible.push((id, req)),
            }
        }
        if eligible.is_empty() {
            debug!(phase = %SyncPhase::Create, "no eligible records, skipping phase");
            return Ok(());
        }

        let reqs: Vec<&Requirement> = eligible.iter().map(|(_, req)| *req).collect();
        let failed_labels = self.ensure_labels(self.wanted_labels(&reqs)).await;

        let mut failures = Vec::new();
        let mut tasks = Vec::new();
        for (id, req) in eligible {
            match self.prepare_fields(req, &failed_labels) {
                Ok(fields) => tasks.push(Task::new(
                    id,
                    req,
                    self.create_record(req.req_id.clone(), fields),
                )),
                Err(e) => failures.push(TaskFailure::new(&req.req_id, &e)),
            }
        }

        let (done, task_failures) = fan_out(SyncPhase::Create, tasks).await;
        failures.extend(task_failures);
        for (id, key) in done {
            if let Some(req) = tree.get_mut(id) {
                req.remote_id = Some(key);
            }
        }
        phase_result(SyncPhase::Create, failures)
    }

    async fn create_record(&self, req_id: String, fields: RecordFields) -> SyncResult<String> {
        debug!(req_id = %req_id, "creating record");
        let key = self.remote.create_record(fields).await?;
        self.lock_links().insert(req_id, key.clone());
        Ok(key)
    }

    async fn update_phase(&self, tree: &ReqTree) -> SyncResult<()> {
        let eligible: Vec<(NodeId, &Requirement)> = tree
            .iter()
            .filter(|(_, req)| {
                req.has(InternalStatus::Updated)
                    && !req.has(InternalStatus::Created)
                    && req
                        .updated_fields
                        .iter()
                        .any(|f| !matches!(f, Attribute::Links | Attribute::Status))
            })
            .collect();
        if eligible.is_empty() {
            debug!(phase = %SyncPhase::Update, "no eligible records, skipping phase");
            return Ok(());
        }

        let reqs: Vec<&Requirement> = eligible.iter().map(|(_, req)| *req).collect();
        let failed_labels = self.ensure_labels(self.wanted_labels(&reqs)).await;

        let mut failures = Vec::new();
        let mut tasks = Vec::new();
        for (id, req) in eligible {
            match self.prepare_fields(req, &failed_labels) {
                Ok(fields) => tasks.push(Task::new(
                    id,
                    req,
                    self.update_record(req.req_id.clone(), req.remote_id.clone(), fields),
                )),
                Err(e) => failures.push(TaskFailure::new(&req.req_id, &e)),
            }
        }

        let (_, task_failures) = fan_out(SyncPhase::Update, tasks).await;
        failures.extend(task_failures);
        phase_result(SyncPhase::Update, failures)
    }

    async fn update_record(
        &self,
        req_id: String,
        remote_id: Option<String>,
        fields: RecordFields,
    ) -> SyncResult<()> {
        let key = require_key(&req_id, remote_id.as_deref())?;
        debug!(req_id = %req_id, key = %key, "updating record");
        self.remote.update_record(&key, fields).await?;
        Ok(())
    }

    /// Upload new attachments one record at a time.
    async fn attachment_phase(&self, tree: &ReqTree) -> SyncResult<()> {
        let eligible: Vec<&Requirement> = tree
            .iter()
            .map(|(_, req)| req)
            .filter(|req| {
                !req.attachment_hashes.is_empty()
                    && (req.is_updated(Attribute::AttachmentHashes)
                        || req.has(InternalStatus::Created))
            })
            .collect();
        if eligible.is_empty() {
            debug!(phase = %SyncPhase::Attachments, "no eligible records, skipping phase");
            return Ok(());
        }
        info!(phase = %SyncPhase::Attachments, tasks = eligible.len(), "starting phase");

        let mut failures = Vec::new();
        for req in eligible {
            if let Err(e) = self.upload_attachments(req).await {
                warn!(req_id = %req.req_id, error = %e, "attachment upload failed");
                failures.push(TaskFailure::new(&req.req_id, &e));
            }
        }
        phase_result(SyncPhase::Attachments, failures)
    }

    async fn upload_attachments(&self, req: &Requirement) -> SyncResult<()> {
        let key = require_key(&req.req_id, req.remote_id.as_deref())?;
        // A new record has nothing stored remotely yet.
        let created = req.has(InternalStatus::Created);
        let existing: HashSet<String> = if created {
            HashSet::new()
        } else {
            self.remote.record_attachments(&key).await?.into_iter().collect()
        };

        for (name, source) in &req.attachment_hashes {
            // On existing records a name mapped to itself is already stored.
            if !created && (name == source || existing.contains(name)) {
                continue;
            }
            debug!(key = %key, name = %name, "uploading attachment");
            self.remote
                .upload_attachment(&key, Path::new(source), name)
                .await?;
        }
        Ok(())
    }

    async fn transition_phase(&self, tree: &ReqTree) -> SyncResult<()> {
        let tasks: Vec<_> = tree
            .iter()
            .filter(|(_, req)| {
                req.is_updated(Attribute::Status) || req.has(InternalStatus::Created)
            })
            .filter_map(|(id, req)| {
                let status = req.status?;
                Some(Task::new(
                    id,
                    req,
                    self.transition_record(req.req_id.clone(), req.remote_id.clone(), status),
                ))
            })
            .collect();

        let (_, failures) = fan_out(SyncPhase::Transition, tasks).await;
        phase_result(SyncPhase::Transition, failures)
    }

    async fn transition_record(
        &self,
        req_id: String,
        remote_id: Option<String>,
        status: Status,
    ) -> SyncResult<()> {
        let key = require_key(&req_id, remote_id.as_deref())?;
        let (state, via) = transition_target(status);
        debug!(key = %key, state, "transitioning record");
        self.remote.transition(&key, state, via).await?;
        Ok(())
    }

    async fn link_phase(&self, tree: &ReqTree) -> SyncResult<()> {
        let tasks: Vec<_> = tree
            .iter()
            .filter(|(_, req)| {
                req.is_updated(Attribute::Links)
                    || req.is_updated(Attribute::Satisfies)
                    || (req.has(InternalStatus::Created) && !req.link_targets().is_empty())
            })
            .map(|(id, req)| {
                Task::new(
                    id,
                    req,
                    self.link_record(req.req_id.clone(), req.remote_id.clone(), req.link_targets()),
                )
            })
            .collect();

        let (_, failures) = fan_out(SyncPhase::Link, tasks).await;
        phase_result(SyncPhase::Link, failures)
    }

    /// Make the remote's outward requirement links match `targets`.
    async fn link_record(
        &self,
        req_id: String,
        remote_id: Option<String>,
        targets: BTreeSet<String>,
    ) -> SyncResult<()> {
        let key = require_key(&req_id, remote_id.as_deref())?;
        let mut existing: HashMap<String, String> = self
            .remote
            .record_links(&key)
            .await?
            .into_iter()
            .filter(|link| is_requirement_link(&link.link_type, &link.target_issue_type))
            .map(|link| (link.target_key, link.id))
            .collect();

        let resolved: Vec<String> = {
            let links = self.lock_links();
            targets
                .iter()
                .filter_map(|target| {
                    let resolved = links.resolve(target);
                    if resolved.is_none() {
                        warn!(req_id = %req_id, target = %target, "skipping unresolvable link target");
                    }
                    resolved
                })
                .collect()
        };

        for target in resolved {
            if existing.remove(&target).is_some() {
                continue;
            }
            debug!(from = %key, to = %target, "creating link");
            self.remote
                .create_link(self.config.link_type(), &key, &target)
                .await?;
        }
        for (target, link_id) in existing {
            debug!(from = %key, to = %target, "deleting stale link");
            self.remote.delete_link(&link_id).await?;
        }
        Ok(())
    }

    /// Re-parent records one at a time, walking the hierarchy top-down so
    /// parents are in place before their children.
    async fn move_phase(&self, tree: &ReqTree, folder: FolderId) -> SyncResult<()> {
        let mut queue: Vec<NodeId> = tree
            .depth_first()
            .into_iter()
            .filter(|&id| tree.get(id).is_some_and(needs_move))
            .collect();

        // Records detached by deletion are only moved by this sweep.
        if self.config.move_deleted {
            let in_deleted_folder = ParentRef::Folder(self.deleted_folder);
            let candidates: Vec<NodeId> = tree.deleted().iter().copied().chain(tree.ids()).collect();
            for id in candidates {
                let Some(req) = tree.get(id) else {
                    continue;
                };
                if !req.has(InternalStatus::Deleted) || queue.contains(&id) {
                    continue;
                }
                let parked = req
                    .remote_id
                    .as_ref()
                    .and_then(|key| self.parents.get(key))
                    == Some(&in_deleted_folder);
                if !parked {
                    queue.push(id);
                }
            }
        }

        if queue.is_empty() {
            debug!(phase = %SyncPhase::Move, "no eligible records, skipping phase");
            return Ok(());
        }
        info!(phase = %SyncPhase::Move, tasks = queue.len(), "starting phase");

        let mut failures = Vec::new();
        for id in queue {
            let Some(req) = tree.get(id) else {
                continue;
            };
            if let Err(e) = self.move_record(tree, id, req, folder).await {
                warn!(req_id = %req.req_id, error = %e, "move failed");
                failures.push(TaskFailure::new(&req.req_id, &e));
            }
        }
        phase_result(SyncPhase::Move, failures)
    }

    async fn move_record(
        &self,
        tree: &ReqTree,
        id: NodeId,
        req: &Requirement,
        folder: FolderId,
    ) -> SyncResult<()> {
        let key = require_key(&req.req_id, req.remote_id.as_deref())?;
        let project = self.config.project.as_str();

        // Unlinking from a stale parent is best effort.
        match self.parents.get(&key) {
            Some(ParentRef::Folder(old)) => {
                if let Err(e) = self.remote.remove_from_folder(project, *old, &key).await {
                    warn!(key = %key, folder = old, error = %e, "could not remove record from folder");
                }
            }
            Some(ParentRef::Record(old)) => {
                if let Err(e) = self.remote.remove_child(project, old, &key).await {
                    warn!(key = %key, parent = %old, error = %e, "could not unlink record from parent");
                }
            }
            None => {}
        }

        match tree.parent(id).and_then(|parent| tree.get(parent)) {
            Some(parent) => {
                let parent_key = require_key(&parent.req_id, parent.remote_id.as_deref())?;
                debug!(key = %key, parent = %parent_key, "moving record under parent");
                self.remote.add_child(project, &parent_key, &key).await?;
            }
            None if !req.has(InternalStatus::Deleted) => {
                debug!(key = %key, folder, "moving record to folder");
                self.remote.add_to_folder(project, folder, &key).await?;
            }
            None => {
                debug!(key = %key, folder = self.deleted_folder, "moving record to deleted folder");
                self.remote
                    .add_to_folder(project, self.deleted_folder, &key)
                    .await?;
            }
        }
        Ok(())
    }
}
