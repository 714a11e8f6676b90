// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use rq_core::{HierarchyNode, Status};

fn req(id: &str, content: &str) -> (String, Requirement) {
    let mut req = Requirement::new(id);
    req.content = Some(content.to_string());
    (format!("K-{}", id), req)
}

#[test]
fn renders_nested_hierarchy_with_connectors() {
    let mut records = vec![
        req("H-1", "Braking"),
        req("REQ-1", "The <xhtml:b>brake</xhtml:b> shall engage"),
        req("REQ-2", "Release within 2 s"),
        req("REQ-3", "Warn the driver"),
        req("H-2", "Lighting"),
    ];
    records[1].1.status = Some(Status::Accepted);
    let hierarchy = vec![
        HierarchyNode::with_children(
            "K-H-1",
            vec![
                HierarchyNode::with_children("K-REQ-1", vec![HierarchyNode::new("K-REQ-2")]),
                HierarchyNode::new("K-REQ-3"),
            ],
        ),
        HierarchyNode::new("K-H-2"),
    ];
    let tree = ReqTree::build(records, &hierarchy).unwrap();

    assert_eq!(
        render(&tree),
        vec![
            "H-1: Braking",
            "├── REQ-1: The brake shall engage [Accepted]",
            "│   └── REQ-2: Release within 2 s",
            "└── REQ-3: Warn the driver",
            "H-2: Lighting",
        ]
    );
}

#[test]
fn unplaced_records_are_not_rendered() {
    let records = vec![req("REQ-1", "Placed"), req("REQ-2", "Loose")];
    let tree = ReqTree::build(records, &[HierarchyNode::new("K-REQ-1")]).unwrap();
    assert_eq!(render(&tree), vec!["REQ-1: Placed"]);
}
