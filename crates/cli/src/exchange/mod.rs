// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exchange documents.
//!
//! An exchange document is a self-describing requirement interchange file:
//! enumeration datatypes, spec object types with their attribute
//! definitions, spec objects carrying attribute values, relations between
//! objects, and specifications arranging objects into a hierarchy.
//!
//! Documents are persisted through a [`DocumentStore`]; [`JsonFileStore`]
//! keeps one document per JSON file.

mod transceiver;

pub use transceiver::ExchangeTransceiver;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Namespace of the XHTML fragments stored in `xhtml` values.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A complete exchange document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Document {
    #[serde(default)]
    pub datatypes: Vec<EnumDatatype>,
    #[serde(default)]
    pub spec_types: Vec<SpecObjectType>,
    #[serde(default)]
    pub spec_objects: Vec<SpecObject>,
    #[serde(default)]
    pub relations: Vec<SpecRelation>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
}

/// Enumeration datatype and its allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnumDatatype {
    pub identifier: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnumValue {
    pub identifier: String,
    pub long_name: String,
}

/// Type of spec objects, listing the attributes they may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecObjectType {
    pub identifier: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttributeDefinition {
    pub identifier: String,
    pub long_name: String,
    /// Value kind: `integer`, `boolean`, `string`, `date`, `real`, `xhtml`
    /// or `enumeration`.
    pub kind: String,
    /// Datatype reference; required for enumerations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// One requirement object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecObject {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change: Option<String>,
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

/// Value of one attribute on a spec object.
///
/// Scalar kinds and `xhtml` keep their content in `value`; enumerations
/// reference enum values through `enum_refs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttributeValue {
    pub kind: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_refs: Vec<String>,
}

/// Directed relation between two spec objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecRelation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Specification {
    pub identifier: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub children: Vec<SpecHierarchy>,
}

/// Placement of one spec object inside a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecHierarchy {
    pub identifier: String,
    /// Referenced spec object.
    pub object: String,
    #[serde(default)]
    pub is_table_internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change: Option<String>,
    #[serde(default)]
    pub children: Vec<SpecHierarchy>,
}

impl Document {
    /// Attribute definition by identifier, across all spec object types.
    pub fn definition(&self, identifier: &str) -> Option<&AttributeDefinition> {
        self.spec_types
            .iter()
            .flat_map(|t| &t.attributes)
            .find(|d| d.identifier == identifier)
    }

    /// Attribute definition by long name, across all spec object types.
    pub fn definition_by_name(&self, long_name: &str) -> Option<&AttributeDefinition> {
        self.spec_types
            .iter()
            .flat_map(|t| &t.attributes)
            .find(|d| d.long_name == long_name)
    }

    pub fn datatype(&self, identifier: &str) -> Option<&EnumDatatype> {
        self.datatypes.iter().find(|d| d.identifier == identifier)
    }

    /// Long name of an enum value, looked up across all datatypes.
    pub fn enum_long_name(&self, identifier: &str) -> Option<&str> {
        self.datatypes
            .iter()
            .flat_map(|d| &d.values)
            .find(|v| v.identifier == identifier)
            .map(|v| v.long_name.as_str())
    }

    pub fn spec_object(&self, identifier: &str) -> Option<&SpecObject> {
        self.spec_objects.iter().find(|o| o.identifier == identifier)
    }
}

impl EnumDatatype {
    /// Identifier of the value with the given long name.
    pub fn value_ref(&self, long_name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.long_name == long_name)
            .map(|v| v.identifier.as_str())
    }
}

/// Persistence for exchange documents.
pub trait DocumentStore {
    fn load(&self) -> Result<Document>;

    fn save(&self, document: &Document) -> Result<()>;

    /// Directory that relative image references resolve against.
    fn base_dir(&self) -> PathBuf;
}

/// Stores a document as pretty-printed JSON in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Document> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, document: &Document) -> Result<()> {
        let mut content = serde_json::to_string_pretty(document)?;
        content.push('\n');
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
