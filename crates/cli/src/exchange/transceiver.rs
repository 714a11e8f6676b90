// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Requirement trees read from and written to exchange documents.
//!
//! Reading resolves every attribute value to text, maps attribute long
//! names onto requirement fields through the configured attribute mapping
//! and builds the tree from the first specification. Writing either fills
//! a template with new spec objects or updates the status and comments of
//! existing ones.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rq_core::markup::{self, exchange};
use rq_core::requirement::raw_text;
use rq_core::{
    AttachmentHashes, Attribute, Category, HierarchyNode, InternalStatus, NodeId, ReqTree,
    Requirement,
};

use super::{
    AttributeDefinition, AttributeValue, Document, DocumentStore, JsonFileStore, SpecHierarchy,
    SpecObject, XHTML_NAMESPACE,
};
use crate::config::ExchangeConfig;
use crate::error::{Error, Result};

/// Attribute receiving the content of headings.
const CHAPTER_NAME: &str = "ReqIF.ChapterName";
/// Attribute receiving the content of everything but headings.
const TEXT: &str = "ReqIF.Text";
/// Table-cell text, used as content when an object has none.
const TABLE_TYPE: &str = "TableType";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

enum ValueKind {
    Scalar,
    Xhtml,
    Enumeration,
}

fn value_kind(kind: &str) -> Option<ValueKind> {
    match kind.to_ascii_lowercase().as_str() {
        "integer" | "boolean" | "string" | "date" | "real" => Some(ValueKind::Scalar),
        "xhtml" => Some(ValueKind::Xhtml),
        "enumeration" => Some(ValueKind::Enumeration),
        _ => None,
    }
}

/// Reads and writes one exchange document.
///
/// With a template configured, the template is the working document and
/// [`write`](Self::write) creates a spec object per requirement. Without
/// one, the store's document is updated in place.
pub struct ExchangeTransceiver<S: DocumentStore> {
    store: S,
    config: ExchangeConfig,
    /// Default attribute mapping overlaid with the configured one.
    attributes: BTreeMap<String, Vec<String>>,
    inverse_mapping: BTreeMap<String, String>,
    document: Document,
    from_template: bool,
}

impl<S: DocumentStore> ExchangeTransceiver<S> {
    pub fn open(store: S, config: ExchangeConfig) -> Result<Self> {
        let document = match &config.template {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::TemplateNotFound(path.clone()));
                }
                JsonFileStore::new(path).load()?
            }
            None => store.load()?,
        };

        let mut attributes = ExchangeConfig::default().attributes;
        attributes.extend(config.attributes.clone());
        let inverse_mapping = config.inverse_mapping();
        let from_template = config.template.is_some();

        Ok(ExchangeTransceiver {
            store,
            config,
            attributes,
            inverse_mapping,
            document,
            from_template,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read all spec objects into a tree arranged by the first specification.
    pub fn read(&self) -> Result<ReqTree> {
        let base_dir = self.store.base_dir();
        let mut relations: HashMap<&str, Vec<&str>> = HashMap::new();
        for relation in &self.document.relations {
            relations
                .entry(relation.source.as_str())
                .or_default()
                .push(relation.target.as_str());
        }

        let mut records = Vec::with_capacity(self.document.spec_objects.len());
        let mut req_ids: HashMap<&str, String> = HashMap::new();
        for object in &self.document.spec_objects {
            let values = self.resolve_values(object)?;
            let req = self.to_requirement(object, values, &base_dir)?;
            req_ids.insert(object.identifier.as_str(), req.req_id.clone());
            records.push((object.identifier.clone(), req));
        }

        for (identifier, req) in &mut records {
            let Some(targets) = relations.get(identifier.as_str()) else {
                continue;
            };
            for target in targets {
                let link = req_ids
                    .get(target)
                    .cloned()
                    .unwrap_or_else(|| target.to_string());
                req.links.insert(link);
            }
        }

        let specification = self
            .document
            .specifications
            .first()
            .ok_or(Error::NoSpecification)?;
        let hierarchy: Vec<HierarchyNode> =
            specification.children.iter().map(hierarchy_node).collect();
        let tree = ReqTree::build(records, &hierarchy)?;
        info!(records = tree.len(), "read exchange document");
        Ok(tree)
    }

    /// Write the tree back and save the document through the store.
    ///
    /// Pending change flags are cleared once the document is saved.
    pub fn write(&mut self, tree: &mut ReqTree) -> Result<()> {
        if self.from_template {
            self.create_from_template(tree)?;
        } else {
            self.update_objects(tree)?;
        }
        self.store.save(&self.document)?;
        tree.clear_sync_state();
        Ok(())
    }

    /// Attribute long name → value text for one object.
    fn resolve_values(&self, object: &SpecObject) -> Result<BTreeMap<String, String>> {
        let mut values = BTreeMap::new();
        for value in &object.values {
            let definition = self.document.definition(&value.definition).ok_or_else(|| {
                Error::UnknownDefinition {
                    what: "attribute definition",
                    reference: value.definition.clone(),
                }
            })?;
            let text = match value_kind(&value.kind) {
                Some(ValueKind::Scalar | ValueKind::Xhtml) => value.value.clone().unwrap_or_default(),
                Some(ValueKind::Enumeration) => value
                    .enum_refs
                    .iter()
                    .map(|r| {
                        self.document.enum_long_name(r).ok_or_else(|| Error::UnknownDefinition {
                            what: "enum value",
                            reference: r.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
                    .join(", "),
                None => {
                    return Err(Error::UnknownAttributeType {
                        object: object.identifier.clone(),
                        kind: value.kind.clone(),
                    })
                }
            };
            values.insert(definition.long_name.clone(), text);
        }
        Ok(values)
    }

    /// Copy mapped attribute values onto their field names. Later names in a
    /// field's list win.
    fn map_fields(&self, mut values: BTreeMap<String, String>) -> BTreeMap<String, String> {
        for (field, names) in &self.attributes {
            for name in names {
                if let Some(value) = values.get(name).cloned() {
                    values.insert(field.clone(), value);
                }
            }
        }
        values
    }

    fn to_requirement(
        &self,
        object: &SpecObject,
        values: BTreeMap<String, String>,
        base_dir: &Path,
    ) -> Result<Requirement> {
        let fields = self.map_fields(values);
        let field = |name: &str| fields.get(name).map(String::as_str).filter(|v| !v.is_empty());

        let req_id = field("req_id")
            .map(|id| markup::strip_tags(id).trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| object.identifier.clone());
        let mut req = Requirement::new(req_id);
        let mut hashes = AttachmentHashes::new();

        if let Some(content) = fields.get("content") {
            req.content = Some(canonical(content, base_dir, &mut hashes));
        } else if let Some(content) = self.default_value("content") {
            req.content = Some(content.to_string());
        }
        if req.summary().is_none() {
            if let Some(table) = field(TABLE_TYPE) {
                req.content = Some(table.to_string());
                req.set_summary(Some(&markup::strip_tags(table)));
            } else if let Some(summary) = self.default_value("summary") {
                req.set_summary(Some(summary));
            }
        }

        req.category = Some(self.enum_field(field("category"), "category")?.unwrap_or(Category::Custom));
        req.asil = self.enum_field(field("asil"), "asil")?;
        req.status = self.enum_field(field("status"), "status")?;
        req.status_customer = self.enum_field(field("status_customer"), "status_customer")?;

        match field("test_levels") {
            Some(levels) => {
                for level in levels.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                    req.test_levels.insert(self.mapped(level).parse()?);
                }
            }
            None => {
                if let Some(level) = self.default_value("test_levels") {
                    req.test_levels.insert(level.parse()?);
                }
            }
        }

        let mut rich = |name: &str| match field(name) {
            Some(text) => Some(canonical(text, base_dir, &mut hashes)),
            None => self.default_value(name).map(String::from),
        };
        req.customer_comments = rich("customer_comments");
        req.internal_comments = rich("internal_comments");
        req.review_comments = rich("review_comments");

        if let Some(component) = field("components") {
            req.components.insert(component.to_string());
        }
        req.attachment_hashes = hashes;
        Ok(req)
    }

    fn default_value(&self, field: &str) -> Option<&str> {
        self.config
            .defaults
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Exchange value translated through the value mapping.
    fn mapped<'a>(&'a self, value: &'a str) -> &'a str {
        self.config
            .value_mapping
            .get(value)
            .map_or(value, String::as_str)
    }

    /// Parse a mapped document value, or the configured default.
    fn enum_field<T>(&self, value: Option<&str>, field: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = rq_core::Error>,
    {
        let parsed = match value {
            Some(value) => Some(self.mapped(value).parse()?),
            None => self.default_value(field).map(str::parse).transpose()?,
        };
        Ok(parsed)
    }

    fn create_from_template(&mut self, tree: &ReqTree) -> Result<()> {
        let object_type = self
            .document
            .spec_types
            .first()
            .map(|t| t.identifier.clone())
            .ok_or_else(|| Error::UnknownDefinition {
                what: "spec object type",
                reference: "(none)".to_string(),
            })?;
        if self.document.specifications.is_empty() {
            return Err(Error::NoSpecification);
        }

        let now = timestamp();
        let mut object_ids: HashMap<NodeId, String> = HashMap::new();
        let mut objects = Vec::new();
        for (id, req) in tree.iter() {
            if req.has(InternalStatus::Deleted) {
                continue;
            }
            let object = self.new_spec_object(req, &object_type, &now)?;
            object_ids.insert(id, object.identifier.clone());
            objects.push(object);
        }

        let children: Vec<SpecHierarchy> = tree
            .roots()
            .iter()
            .filter_map(|&root| hierarchy_entry(tree, root, &object_ids, &now))
            .collect();

        info!(objects = objects.len(), "created spec objects from template");
        self.document.spec_objects.extend(objects);
        if let Some(specification) = self.document.specifications.first_mut() {
            specification.children.extend(children);
        }
        Ok(())
    }

    fn new_spec_object(&self, req: &Requirement, object_type: &str, now: &str) -> Result<SpecObject> {
        let mut object = SpecObject {
            identifier: new_identifier(),
            long_name: Some(req.req_id.clone()),
            object_type: object_type.to_string(),
            last_change: Some(now.to_string()),
            values: Vec::new(),
        };

        for (field, names) in &self.attributes {
            let attribute: Attribute = field.parse()?;
            let Some(text) = req.attribute_text(attribute) else {
                continue;
            };
            let content_name;
            let names: &[String] = if attribute == Attribute::Content {
                let name = if req.category == Some(Category::Heading) {
                    CHAPTER_NAME
                } else {
                    TEXT
                };
                content_name = [name.to_string()];
                &content_name
            } else {
                names
            };

            for name in names {
                let Some(definition) = self.document.definition_by_name(name) else {
                    continue;
                };
                if let Some(value) = self.encode_value(definition, &text, &req.attachment_hashes)? {
                    object.values.push(value);
                }
            }
        }
        Ok(object)
    }

    fn encode_value(
        &self,
        definition: &AttributeDefinition,
        text: &str,
        hashes: &AttachmentHashes,
    ) -> Result<Option<AttributeValue>> {
        let (value, enum_refs) = match value_kind(&definition.kind) {
            Some(ValueKind::Xhtml) => (Some(xhtml_div(&exchange::to_exchange(text, hashes))), Vec::new()),
            Some(ValueKind::Enumeration) => (None, self.enum_refs(definition, text)?),
            Some(ValueKind::Scalar) => (Some(raw_text(text)), Vec::new()),
            None => {
                debug!(kind = %definition.kind, attribute = %definition.long_name, "skipping attribute of unknown kind");
                return Ok(None);
            }
        };
        Ok(Some(AttributeValue {
            kind: definition.kind.clone(),
            definition: definition.identifier.clone(),
            value,
            enum_refs,
        }))
    }

    /// Enum value identifiers for a comma-separated list of labels, after
    /// inverse value mapping.
    fn enum_refs(&self, definition: &AttributeDefinition, text: &str) -> Result<Vec<String>> {
        let reference = definition.datatype.clone().unwrap_or_default();
        let datatype = self
            .document
            .datatype(&reference)
            .ok_or(Error::UnknownDefinition {
                what: "datatype",
                reference,
            })?;
        let datatype_name = if datatype.long_name.is_empty() {
            &datatype.identifier
        } else {
            &datatype.long_name
        };

        text.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|label| {
                let value = self.inverse_mapping.get(label).map_or(label, String::as_str);
                datatype
                    .value_ref(value)
                    .map(String::from)
                    .ok_or_else(|| Error::EnumValueUndefined {
                        value: value.to_string(),
                        datatype: datatype_name.clone(),
                    })
            })
            .collect()
    }

    /// First configured definition present in the document for `field`.
    fn configured_definition(&self, field: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .get(field)?
            .iter()
            .find_map(|name| self.document.definition_by_name(name))
    }

    fn update_objects(&mut self, tree: &ReqTree) -> Result<()> {
        let now = timestamp();
        let mut updated = 0usize;

        for (_, req) in tree.iter() {
            if !req.has(InternalStatus::Updated) {
                continue;
            }
            let index = self
                .find_spec_object(&req.req_id)
                .ok_or_else(|| Error::SpecObjectNotFound(req.req_id.clone()))?;

            let mut values = Vec::new();
            if let Some(status) = req.status {
                match self.configured_definition("status") {
                    Some(definition) => values.push(AttributeValue {
                        kind: definition.kind.clone(),
                        definition: definition.identifier.clone(),
                        value: None,
                        enum_refs: self.enum_refs(definition, status.as_str())?,
                    }),
                    None => debug!(req_id = %req.req_id, "document has no status attribute"),
                }
            }

            let comments = [
                ("internal_comments", &req.internal_comments),
                ("customer_comments", &req.customer_comments),
                ("review_comments", &req.review_comments),
            ];
            for (field, text) in comments {
                let Some(text) = text.as_deref().filter(|t| !t.is_empty()) else {
                    continue;
                };
                if let Some(definition) = self.configured_definition(field) {
                    values.push(AttributeValue {
                        kind: definition.kind.clone(),
                        definition: definition.identifier.clone(),
                        value: Some(xhtml_div(&exchange::to_exchange(text, &req.attachment_hashes))),
                        enum_refs: Vec::new(),
                    });
                }
            }

            let object = &mut self.document.spec_objects[index];
            for value in values {
                replace_value(object, value);
            }
            object.last_change = Some(now.clone());
            updated += 1;
        }

        info!(updated, "updated spec objects");
        Ok(())
    }

    /// Index of the spec object named `req_id`, or carrying it as a value.
    fn find_spec_object(&self, req_id: &str) -> Option<usize> {
        let objects = &self.document.spec_objects;
        objects
            .iter()
            .position(|o| o.long_name.as_deref() == Some(req_id))
            .or_else(|| {
                objects.iter().position(|o| {
                    o.values.iter().any(|v| {
                        v.value
                            .as_deref()
                            .is_some_and(|text| markup::strip_tags(text).trim() == req_id)
                    })
                })
            })
    }
}

fn canonical(fragment: &str, base_dir: &Path, hashes: &mut AttachmentHashes) -> String {
    exchange::to_canonical(fragment, |data| hash_image(data, base_dir, hashes))
}

/// Content-addressed name (`<sha256>.<ext>`) of a referenced image.
///
/// Paths are tried as given, then relative to `base_dir`. Unreadable images
/// are dropped from the text.
fn hash_image(data: &str, base_dir: &Path, hashes: &mut AttachmentHashes) -> Option<String> {
    let direct = Path::new(data);
    let path = if direct.is_file() {
        direct.to_path_buf()
    } else {
        base_dir.join(data)
    };
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(image = %path.display(), error = %e, "dropping unreadable image");
            return None;
        }
    };

    let digest = hex::encode(Sha256::digest(&bytes));
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", digest, ext),
        None => digest,
    };
    hashes.insert(name.clone(), path.display().to_string());
    Some(name)
}

fn hierarchy_node(entry: &SpecHierarchy) -> HierarchyNode {
    HierarchyNode {
        key: entry.object.clone(),
        table_internal: entry.is_table_internal,
        children: entry.children.iter().map(hierarchy_node).collect(),
    }
}

fn hierarchy_entry(
    tree: &ReqTree,
    id: NodeId,
    object_ids: &HashMap<NodeId, String>,
    now: &str,
) -> Option<SpecHierarchy> {
    let object = object_ids.get(&id)?.clone();
    Some(SpecHierarchy {
        identifier: new_identifier(),
        object,
        is_table_internal: false,
        last_change: Some(now.to_string()),
        children: tree
            .children(id)
            .iter()
            .filter_map(|&child| hierarchy_entry(tree, child, object_ids, now))
            .collect(),
    })
}

fn replace_value(object: &mut SpecObject, value: AttributeValue) {
    match object.values.iter_mut().find(|v| v.definition == value.definition) {
        Some(existing) => *existing = value,
        None => object.values.push(value),
    }
}

fn xhtml_div(body: &str) -> String {
    format!(r#"<xhtml:div xmlns:xhtml="{}">{}</xhtml:div>"#, XHTML_NAMESPACE, body)
}

fn new_identifier() -> String {
    format!("_{}", Uuid::new_v4())
}

fn timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
#[path = "transceiver_tests.rs"]
mod tests;
