// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::sync::{SyncPhase, TaskFailure};

#[test]
fn test_error_template_not_found_display() {
    let err = Error::TemplateNotFound(PathBuf::from("/tmp/template.json"));
    let msg = err.to_string();
    assert!(msg.contains("template not found"));
    assert!(msg.contains("/tmp/template.json"));
    assert!(msg.contains("hint:"));
}

#[test]
fn test_error_unknown_attribute_type_names_object() {
    let err = Error::UnknownAttributeType {
        object: "SO-17".to_string(),
        kind: "ATTRIBUTE-VALUE-BLOB".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("SO-17"));
    assert!(msg.contains("ATTRIBUTE-VALUE-BLOB"));
}

#[test]
fn test_error_enum_value_undefined_display() {
    let err = Error::EnumValueUndefined {
        value: "Released".to_string(),
        datatype: "DT-Status".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "enum value 'Released' is not defined for datatype DT-Status"
    );
}

#[test]
fn test_core_errors_pass_through() {
    let err: Error = rq_core::Error::UnknownHierarchyRef("K-9".to_string()).into();
    assert!(err.to_string().starts_with("hierarchy references unknown record 'K-9'"));
}

#[test]
fn test_sync_phase_error_lists_failures() {
    let err: Error = SyncError::Phase {
        phase: SyncPhase::Update,
        failures: vec![TaskFailure {
            req_id: "REQ-3".to_string(),
            reason: "remote rejected request".to_string(),
        }],
    }
    .into();
    let msg = err.to_string();
    assert!(msg.contains("update"));
    assert!(msg.contains("REQ-3: remote rejected request"));
}

#[test]
fn test_io_error_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(err.to_string().contains("io error"));
}
