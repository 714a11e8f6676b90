// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

const DOCUMENT_JSON: &str = r#"{
  "datatypes": [
    {
      "identifier": "DT-STATUS",
      "long-name": "Status Values",
      "values": [
        { "identifier": "EV-NEW", "long-name": "New" },
        { "identifier": "EV-ACC", "long-name": "Accepted" }
      ]
    }
  ],
  "spec-types": [
    {
      "identifier": "SOT-1",
      "long-name": "Requirement",
      "attributes": [
        { "identifier": "AD-ID", "long-name": "ID", "kind": "string" },
        { "identifier": "AD-ST", "long-name": "Status", "kind": "enumeration", "datatype": "DT-STATUS" }
      ]
    }
  ],
  "spec-objects": [
    {
      "identifier": "O-1",
      "type": "SOT-1",
      "last-change": "2026-01-05T10:00:00.000000",
      "values": [
        { "kind": "string", "definition": "AD-ID", "value": "REQ-1" },
        { "kind": "enumeration", "definition": "AD-ST", "enum-refs": ["EV-ACC"] }
      ]
    }
  ],
  "specifications": [
    {
      "identifier": "SPEC-1",
      "children": [
        { "identifier": "H-1", "object": "O-1", "is-table-internal": false }
      ]
    }
  ]
}"#;

fn document() -> Document {
    serde_json::from_str(DOCUMENT_JSON).unwrap()
}

#[test]
fn parses_kebab_case_document() {
    let doc = document();
    assert_eq!(doc.spec_objects[0].object_type, "SOT-1");
    assert_eq!(doc.spec_objects[0].long_name, None);
    assert_eq!(doc.spec_objects[0].values[1].enum_refs, vec!["EV-ACC"]);
    assert!(doc.relations.is_empty());
    assert_eq!(doc.specifications[0].children[0].object, "O-1");
}

#[test]
fn lookups_find_definitions_and_enum_values() {
    let doc = document();
    assert_eq!(doc.definition("AD-ST").unwrap().long_name, "Status");
    assert_eq!(doc.definition_by_name("ID").unwrap().identifier, "AD-ID");
    assert!(doc.definition("AD-MISSING").is_none());
    assert_eq!(doc.enum_long_name("EV-NEW"), Some("New"));
    assert_eq!(doc.datatype("DT-STATUS").unwrap().value_ref("Accepted"), Some("EV-ACC"));
    assert_eq!(doc.datatype("DT-STATUS").unwrap().value_ref("Rejected"), None);
    assert!(doc.spec_object("O-1").is_some());
}

#[test]
fn json_file_store_saves_and_loads() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path().join("spec.json"));

    store.save(&document()).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, document());
    assert_eq!(store.base_dir(), temp.path());
    let raw = fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"long-name\": \"Status Values\""));
    assert!(!raw.contains("enum-refs\": []"));
}

#[test]
fn json_file_store_reports_missing_file() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path().join("absent.json"));
    assert!(matches!(store.load(), Err(crate::error::Error::Io(_))));
}
