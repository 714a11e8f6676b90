// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.remote.deleted_folder, "Deleted Requirements");
    assert!(config.remote.move_deleted);
    assert!(!config.remote.use_implements);
    assert_eq!(config.remote.link_type(), "satisfies");
    assert_eq!(config.exchange.attributes["req_id"], vec!["ID"]);
    assert_eq!(config.exchange.attributes["content"], vec!["Text"]);
}

#[test]
fn test_load_partial_file_fills_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
[remote]
project = "BRK"
req_path = "System/Requirements"
use_implements = true
updated_attributes = ["content", "_units"]

[remote.filter]
kind = "jql"
value = "project = BRK"

[exchange.value_mapping]
"To Be Reviewed" = "In Review"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.remote.project, "BRK");
    assert_eq!(config.remote.link_type(), "implements");
    assert!(config.remote.move_deleted);
    assert_eq!(config.remote.deleted_folder, "Deleted Requirements");
    assert_eq!(
        config.remote.updated_attributes,
        Some(vec!["content".to_string(), "_units".to_string()])
    );
    assert_eq!(config.remote.filter.as_ref().unwrap().kind, "jql");
    assert_eq!(config.exchange.attributes["category"], vec!["Category"]);
    assert_eq!(
        config.exchange.inverse_mapping().get("In Review").map(String::as_str),
        Some("To Be Reviewed")
    );
}

#[test]
fn test_explicit_inverse_mapping_wins() {
    let mut config = ExchangeConfig::default();
    config
        .value_mapping
        .insert("Approved".to_string(), "Accepted".to_string());
    let mut inverse = BTreeMap::new();
    inverse.insert("Accepted".to_string(), "Released".to_string());
    config.value_mapping_inverse = Some(inverse);

    assert_eq!(config.inverse_mapping()["Accepted"], "Released");
}

#[test]
fn test_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);

    let mut config = Config::default();
    config.remote.project = "BRK".to_string();
    config.remote.unit_template = Some("{}_SW".to_string());
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_load_errors_name_the_file() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.toml");
    let err = Config::load(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.toml"));

    let broken = temp.path().join("broken.toml");
    fs::write(&broken, "[remote\nproject = 1").unwrap();
    let err = Config::load(&broken).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}
