// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn reqsync() -> Command {
    let mut cmd = cargo_bin_cmd!("reqsync");
    cmd.env_remove("REQSYNC_LOG");
    cmd
}

/// Exchange document with a heading holding two requirements.
pub const DOCUMENT: &str = r#"{
  "datatypes": [
    {
      "identifier": "DT-ST",
      "long-name": "States",
      "values": [{ "identifier": "EV-NEW", "long-name": "New" }]
    }
  ],
  "spec-types": [
    {
      "identifier": "SOT",
      "attributes": [
        { "identifier": "AD-ID", "long-name": "ID", "kind": "string" },
        { "identifier": "AD-TEXT", "long-name": "Text", "kind": "xhtml" },
        { "identifier": "AD-ST", "long-name": "Status", "kind": "enumeration", "datatype": "DT-ST" }
      ]
    }
  ],
  "spec-objects": [
    {
      "identifier": "O-1",
      "type": "SOT",
      "values": [
        { "kind": "string", "definition": "AD-ID", "value": "H-1" },
        { "kind": "xhtml", "definition": "AD-TEXT", "value": "<xhtml:div>Braking</xhtml:div>" }
      ]
    },
    {
      "identifier": "O-2",
      "type": "SOT",
      "values": [
        { "kind": "string", "definition": "AD-ID", "value": "REQ-1" },
        { "kind": "xhtml", "definition": "AD-TEXT", "value": "<xhtml:div>Engage the <xhtml:b>brake</xhtml:b></xhtml:div>" },
        { "kind": "enumeration", "definition": "AD-ST", "enum-refs": ["EV-NEW"] }
      ]
    },
    {
      "identifier": "O-3",
      "type": "SOT",
      "values": [
        { "kind": "string", "definition": "AD-ID", "value": "REQ-2" },
        { "kind": "xhtml", "definition": "AD-TEXT", "value": "Release the brake" }
      ]
    }
  ],
  "specifications": [
    {
      "identifier": "SPEC",
      "children": [
        {
          "identifier": "SH-1",
          "object": "O-1",
          "children": [
            { "identifier": "SH-2", "object": "O-2" },
            { "identifier": "SH-3", "object": "O-3" }
          ]
        }
      ]
    }
  ]
}"#;

/// Write `content` to `name` inside `temp` and return the path.
pub fn write_file(temp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
