// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization configuration.
//!
//! Configuration is stored in `reqsync.toml` with two sections:
//! - `[remote]`: ticket-system project, requirement folder and write options
//! - `[exchange]`: attribute mapping and value mapping for exchange documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "reqsync.toml";

/// Top-level configuration stored in `reqsync.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

/// Saved-filter read mode. Takes precedence over component/label reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Filter kind understood by the remote (e.g. "jql", "saved").
    pub kind: String,
    pub value: String,
}

/// Remote ticket-system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project key.
    #[serde(default)]
    pub project: String,
    /// Folder path of the requirement tree inside the project.
    #[serde(default)]
    pub req_path: String,
    /// Grouping labels every synchronized record carries.
    #[serde(default)]
    pub components: Vec<String>,
    /// Plain labels set on every created or updated record.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Folder receiving deleted records (default: "Deleted Requirements").
    #[serde(default = "default_deleted_folder")]
    pub deleted_folder: String,
    /// Link with "implements" instead of "satisfies".
    #[serde(default)]
    pub use_implements: bool,
    /// Sweep DELETED records into the deleted folder after the move walk.
    #[serde(default = "default_true")]
    pub move_deleted: bool,
    /// Also read records located in the folder that the search missed.
    #[serde(default)]
    pub read_from_folder: bool,
    /// Template for unit grouping labels; `{}` is replaced by the unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_template: Option<String>,
    /// Only push these attributes on update (attribute names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConfig>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            project: String::new(),
            req_path: String::new(),
            components: Vec::new(),
            labels: Vec::new(),
            deleted_folder: default_deleted_folder(),
            use_implements: false,
            move_deleted: true,
            read_from_folder: false,
            unit_template: None,
            updated_attributes: None,
            filter: None,
        }
    }
}

impl RemoteConfig {
    /// Link type used when creating cross-references.
    pub fn link_type(&self) -> &'static str {
        if self.use_implements {
            "implements"
        } else {
            "satisfies"
        }
    }
}

fn default_deleted_folder() -> String {
    "Deleted Requirements".to_string()
}

fn default_true() -> bool {
    true
}

/// Exchange-document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Template document used to create new documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Requirement field → exchange attribute long names, tried in order.
    #[serde(default = "default_attributes")]
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Exchange value → canonical enum label.
    #[serde(default)]
    pub value_mapping: BTreeMap<String, String>,
    /// Canonical enum label → exchange value. Defaults to the inverted `value_mapping`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_mapping_inverse: Option<BTreeMap<String, String>>,
    /// Requirement field → value used when an object has none.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            template: None,
            attributes: default_attributes(),
            value_mapping: BTreeMap::new(),
            value_mapping_inverse: None,
            defaults: BTreeMap::new(),
        }
    }
}

impl ExchangeConfig {
    /// Inverse value mapping, derived from `value_mapping` when not configured.
    pub fn inverse_mapping(&self) -> BTreeMap<String, String> {
        match &self.value_mapping_inverse {
            Some(inverse) => inverse.clone(),
            None => self
                .value_mapping
                .iter()
                .map(|(exchange, canonical)| (canonical.clone(), exchange.clone()))
                .collect(),
        }
    }
}

fn default_attributes() -> BTreeMap<String, Vec<String>> {
    [("req_id", "ID"), ("category", "Category"), ("content", "Text")]
        .into_iter()
        .map(|(field, name)| (field.to_string(), vec![name.to_string()]))
        .collect()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load `path` if given, else `reqsync.toml` in the current directory if
    /// present, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Save configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
