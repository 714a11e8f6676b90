// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn record(key: &str, req_id: &str) -> (String, Requirement) {
    (key.to_string(), Requirement::new(req_id))
}

fn content_record(key: &str, content: &str) -> (String, Requirement) {
    let mut req = Requirement::new(key);
    req.content = Some(content.to_string());
    (key.to_string(), req)
}

fn ids(tree: &ReqTree, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&id| tree.get(id).unwrap().req_id.clone())
        .collect()
}

fn sample() -> ReqTree {
    let records = vec![
        record("K-1", "REQ-1"),
        record("K-2", "REQ-1.1"),
        record("K-3", "REQ-1.2"),
        record("K-4", "REQ-2"),
        record("K-5", "REQ-9"),
    ];
    let hierarchy = vec![
        HierarchyNode::with_children(
            "K-1",
            vec![HierarchyNode::new("K-2"), HierarchyNode::new("K-3")],
        ),
        HierarchyNode::new("K-4"),
    ];
    ReqTree::build(records, &hierarchy).unwrap()
}

#[test]
fn build_links_parents_and_children() {
    let tree = sample();
    let root = tree.find("REQ-1").unwrap();

    assert_eq!(ids(&tree, tree.roots()), vec!["REQ-1", "REQ-2"]);
    assert_eq!(ids(&tree, tree.children(root)), vec!["REQ-1.1", "REQ-1.2"]);
    assert_eq!(tree.parent(tree.find("REQ-1.2").unwrap()), Some(root));
    assert_eq!(tree.parent(root), None);
}

#[test]
fn records_outside_the_hierarchy_float() {
    let tree = sample();
    let floating = tree.find("REQ-9").unwrap();

    assert_eq!(tree.len(), 5);
    assert_eq!(tree.parent(floating), None);
    assert!(!tree.roots().contains(&floating));
    assert!(!tree.depth_first().contains(&floating));
}

#[test]
fn requirements_preserve_input_order() {
    let tree = sample();
    let listed: Vec<&str> = tree.requirements().iter().map(|r| r.req_id.as_str()).collect();
    assert_eq!(listed, vec!["REQ-1", "REQ-1.1", "REQ-1.2", "REQ-2", "REQ-9"]);
}

#[test]
fn depth_first_is_pre_order() {
    let tree = sample();
    assert_eq!(
        ids(&tree, &tree.depth_first()),
        vec!["REQ-1", "REQ-1.1", "REQ-1.2", "REQ-2"]
    );
}

#[test]
fn unknown_hierarchy_reference_is_fatal() {
    let records = vec![record("K-1", "REQ-1")];
    let hierarchy = vec![HierarchyNode::with_children(
        "K-1",
        vec![HierarchyNode::new("K-404")],
    )];
    let err = ReqTree::build(records, &hierarchy).unwrap_err();
    assert!(matches!(err, Error::UnknownHierarchyRef(ref key) if key == "K-404"));
}

#[test]
fn duplicate_hierarchy_reference_is_fatal() {
    let records = vec![record("K-1", "REQ-1"), record("K-2", "REQ-2")];
    let hierarchy = vec![
        HierarchyNode::with_children("K-1", vec![HierarchyNode::new("K-2")]),
        HierarchyNode::new("K-2"),
    ];
    let err = ReqTree::build(records, &hierarchy).unwrap_err();
    assert!(matches!(err, Error::DuplicateHierarchyRef(_)));
}

#[test]
fn table_rows_fold_into_head_content() {
    let records = vec![
        content_record("H", "Intro"),
        content_record("HEAD", "Signals"),
        content_record("R1", ""),
        content_record("C11", "Name"),
        content_record("C12", "Unit"),
        content_record("R2", ""),
        content_record("C21", "speed"),
        content_record("C22", "km/h<xhtml:br/>"),
        content_record("AFTER", "Next"),
    ];
    let internal = |key: &str, children: Vec<HierarchyNode>| HierarchyNode {
        key: key.to_string(),
        table_internal: true,
        children,
    };
    let hierarchy = vec![HierarchyNode::with_children(
        "H",
        vec![
            internal(
                "HEAD",
                vec![
                    internal("R1", vec![internal("C11", vec![]), internal("C12", vec![])]),
                    internal("R2", vec![internal("C21", vec![]), internal("C22", vec![])]),
                ],
            ),
            HierarchyNode::new("AFTER"),
        ],
    )];

    let tree = ReqTree::build(records, &hierarchy).unwrap();

    assert_eq!(tree.len(), 3);
    let head = tree.find("HEAD").unwrap();
    assert!(tree.is_table_head(head));
    assert!(tree.children(head).is_empty());
    assert_eq!(
        tree.get(head).unwrap().content.as_deref().unwrap(),
        "Signals<xhtml:br/><xhtml:table>\
         <xhtml:tr><xhtml:td>Name</xhtml:td><xhtml:td>Unit</xhtml:td></xhtml:tr>\
         <xhtml:tr><xhtml:td>speed</xhtml:td><xhtml:td>km/h</xhtml:td></xhtml:tr>\
         </xhtml:table>"
    );

    let intro = tree.find("H").unwrap();
    assert_eq!(ids(&tree, tree.children(intro)), vec!["HEAD", "AFTER"]);
    assert!(tree.find("C21").is_none());
    assert_eq!(tree.parent(tree.find("AFTER").unwrap()), Some(intro));
}

#[test]
fn insert_marks_created_and_parent_children_updated() {
    let mut tree = sample();
    let parent = tree.find("REQ-2").unwrap();
    let id = tree.insert(Requirement::new("REQ-2.1"), Some(parent)).unwrap();

    assert!(tree.get(id).unwrap().has(InternalStatus::Created));
    assert!(tree.get(parent).unwrap().has(InternalStatus::ChildrenUpdated));
    assert_eq!(ids(&tree, tree.children(parent)), vec!["REQ-2.1"]);

    let root = tree.insert(Requirement::new("REQ-3"), None).unwrap();
    assert_eq!(tree.roots().last(), Some(&root));
}

#[test]
fn move_appears_under_exactly_one_parent() {
    let mut tree = sample();
    let node = tree.find("REQ-1.2").unwrap();
    let old_parent = tree.find("REQ-1").unwrap();
    let new_parent = tree.find("REQ-2").unwrap();

    tree.move_node(node, Some(new_parent)).unwrap();

    assert_eq!(tree.parent(node), Some(new_parent));
    assert!(!tree.children(old_parent).contains(&node));
    assert_eq!(tree.children(new_parent), &[node]);
    let occurrences = tree.depth_first().iter().filter(|&&id| id == node).count();
    assert_eq!(occurrences, 1);

    assert!(tree.get(node).unwrap().has(InternalStatus::Moved));
    assert!(tree.get(old_parent).unwrap().has(InternalStatus::ChildrenUpdated));
    assert!(tree.get(new_parent).unwrap().has(InternalStatus::ChildrenUpdated));
}

#[test]
fn move_to_root_and_back() {
    let mut tree = sample();
    let node = tree.find("REQ-1.1").unwrap();
    tree.move_node(node, None).unwrap();
    assert!(tree.roots().contains(&node));

    let parent = tree.find("REQ-2").unwrap();
    tree.move_node(node, Some(parent)).unwrap();
    assert!(!tree.roots().contains(&node));
}

#[test]
fn move_below_own_descendant_is_rejected() {
    let mut tree = sample();
    let root = tree.find("REQ-1").unwrap();
    let child = tree.find("REQ-1.1").unwrap();

    let err = tree.move_node(root, Some(child)).unwrap_err();
    assert!(matches!(err, Error::HierarchyCycle { .. }));
    assert_eq!(tree.parent(child), Some(root));

    assert!(tree.move_node(root, Some(root)).is_err());
}

#[test]
fn delete_detaches_into_deleted_list() {
    let mut tree = sample();
    let node = tree.find("REQ-1").unwrap();
    let child = tree.find("REQ-1.1").unwrap();

    tree.delete(node).unwrap();
    tree.delete(node).unwrap();

    assert_eq!(tree.deleted(), &[node]);
    assert!(!tree.roots().contains(&node));
    assert!(tree.get(node).unwrap().has(InternalStatus::Deleted));
    // The subtree stays with the deleted record.
    assert_eq!(tree.parent(child), Some(node));
    assert_eq!(tree.len(), 5);

    tree.move_node(node, None).unwrap();
    assert!(tree.deleted().is_empty());
    assert!(!tree.get(node).unwrap().has(InternalStatus::Deleted));
}

#[test]
fn update_flags_the_field() {
    let mut tree = sample();
    let node = tree.find("REQ-2").unwrap();
    tree.update(node, Attribute::Release, |req| {
        req.release = Some("1.0".to_string())
    })
    .unwrap();

    let req = tree.get(node).unwrap();
    assert_eq!(req.release.as_deref(), Some("1.0"));
    assert!(req.is_updated(Attribute::Release));
    assert!(req.has(InternalStatus::Updated));

    tree.clear_sync_state();
    assert!(tree.iter().all(|(_, r)| r.internal_status.is_empty()));
}

#[test]
fn lookups_by_remote_id() {
    let mut tree = sample();
    let node = tree.find("REQ-2").unwrap();
    tree.get_mut(node).unwrap().remote_id = Some("PRJ-42".to_string());

    assert_eq!(tree.find_by_remote_id("PRJ-42"), Some(node));
    assert_eq!(tree.find_by_remote_id("PRJ-1"), None);
    assert!(tree.get(NodeId(99)).is_none());
    assert!(tree.delete(NodeId(99)).is_err());
}
