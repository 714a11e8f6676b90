// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use rq_core::{NodeId, ReqTree, Requirement};

use crate::config::Config;
use crate::error::Result;
use crate::exchange::{ExchangeTransceiver, JsonFileStore};

pub fn run(document: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default(config.as_deref())?;
    let transceiver = ExchangeTransceiver::open(JsonFileStore::new(document), config.exchange)?;
    let tree = transceiver.read()?;
    for line in render(&tree) {
        println!("{}", line);
    }
    Ok(())
}

fn label(req: &Requirement) -> String {
    let summary = req.summary().unwrap_or_default();
    match req.status {
        Some(status) => format!("{}: {} [{}]", req.req_id, summary, status),
        None => format!("{}: {}", req.req_id, summary),
    }
}

/// One line per placed record, children indented below their parent.
pub(crate) fn render(tree: &ReqTree) -> Vec<String> {
    let mut lines = Vec::new();
    for &root in tree.roots() {
        if let Some(req) = tree.get(root) {
            lines.push(label(req));
        }
        render_children(tree, root, "", &mut lines);
    }
    lines
}

fn render_children(tree: &ReqTree, id: NodeId, prefix: &str, lines: &mut Vec<String>) {
    let children = tree.children(id);
    for (i, &child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        if let Some(req) = tree.get(child) {
            lines.push(format!("{}{}{}", prefix, connector, label(req)));
        }
        let child_prefix = if is_last {
            format!("{}    ", prefix)
        } else {
            format!("{}│   ", prefix)
        };
        render_children(tree, child, &child_prefix, lines);
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
