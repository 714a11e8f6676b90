// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversion between remote records and requirements.

use std::collections::BTreeSet;
use std::str::FromStr;

use rq_core::markup::{self, remote};
use rq_core::{Attribute, Category, Requirement, Status};
use tracing::warn;

use super::links::LinkMap;
use super::remote::{RawRecord, RecordFields};
use crate::config::RemoteConfig;

pub const UNIT_PREFIX: &str = "Unit_";
pub const OPTION_PREFIX: &str = "OPT_";
pub const VARIANT_PREFIX: &str = "VAR_";
pub const COMPONENT_PREFIX: &str = "CMP_";

/// Link type of requirement-to-requirement links on the remote.
pub const REQUIREMENT_LINK_TYPE: &str = "Requirement";

/// Workflow state closing a record, whether accepted or rejected.
pub const DONE_STATE: &str = "Done";

const NO_SUMMARY: &str = "No Summary";

/// Build a requirement from a remote record.
///
/// Rich text is converted to canonical markup. Outward requirement links are
/// translated to requirement ids where the link map knows them.
pub fn raw_to_req(raw: &RawRecord, links: &LinkMap, config: &RemoteConfig) -> Requirement {
    let fields = &raw.fields;
    let req_id = fields
        .requirement_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| raw.key.clone());

    let mut req = Requirement::new(req_id);
    req.remote_id = Some(raw.key.clone());
    req.category = parse_or_warn(&raw.key, "issue type", fields.issue_type.as_deref());
    req.content = fields.description.as_deref().map(remote::to_canonical);
    if let Some(summary) = &fields.summary {
        req.set_summary(Some(&remote::to_canonical(summary)));
    }
    if let Some(content) = &req.content {
        req.attachment_hashes = markup::image_names(content)
            .into_iter()
            .map(|name| (name.clone(), name))
            .collect();
    }

    req.review_comments = fields.review_comments.as_deref().map(remote::to_canonical);
    req.customer_comments = fields.customer_comments.as_deref().map(remote::to_canonical);
    req.internal_comments = fields.internal_comments.as_deref().map(remote::to_canonical);
    req.set_satisfies(fields.satisfies.as_deref());

    req.status = match fields.status.as_deref() {
        Some(DONE_STATE) => Some(Status::Accepted),
        state => parse_or_warn(&raw.key, "workflow state", state),
    };
    req.status_customer =
        parse_or_warn(&raw.key, "customer status", fields.customer_status.as_deref());
    req.asil = parse_or_warn(&raw.key, "asil", fields.asil.as_deref());
    req.test_levels = fields
        .test_levels
        .iter()
        .flatten()
        .filter_map(|level| parse_or_warn(&raw.key, "test level", Some(level.as_str())))
        .collect();

    req.links = fields
        .links
        .iter()
        .flatten()
        .filter(|link| link.link_type == REQUIREMENT_LINK_TYPE)
        .filter(|link| Category::from_str(&link.target_issue_type).is_ok())
        .map(|link| {
            links
                .req_id_for(&link.target_key)
                .unwrap_or(&link.target_key)
                .to_string()
        })
        .collect();

    for label in fields.grouping_labels.iter().flatten() {
        if let Some(unit) = label.strip_prefix(UNIT_PREFIX) {
            req.units.insert(unit_from_label(unit, config.unit_template.as_deref()));
        } else if let Some(flag) = label.strip_prefix(OPTION_PREFIX) {
            req.optional_flags.insert(flag.to_string());
        } else if let Some(variant) = label.strip_prefix(VARIANT_PREFIX) {
            req.variants.insert(variant.to_string());
        } else if let Some(component) = label.strip_prefix(COMPONENT_PREFIX) {
            req.components.insert(component.to_string());
        } else {
            req.remote_labels.insert(label.clone());
        }
    }

    req.release = fields
        .fix_versions
        .as_ref()
        .filter(|versions| !versions.is_empty())
        .map(|versions| versions.join(","));

    req
}

/// Field set for creating or updating the remote record of `req`.
///
/// The grouping-label set is rebuilt from the prefixed groups, followed by
/// the unprefixed labels read from the remote and the transceiver-level
/// components from `config`. Labels from `config` are included too; they are
/// the caller's to filter.
pub fn req_to_fields(req: &Requirement, config: &RemoteConfig) -> RecordFields {
    let rich = |text: &Option<String>| {
        text.as_deref()
            .map(|t| remote::to_remote(t, &req.attachment_hashes))
    };

    let mut grouping = grouping_labels(req, config.unit_template.as_deref());
    for label in req.remote_labels.iter().chain(&config.components) {
        if !grouping.contains(label) {
            grouping.push(label.clone());
        }
    }

    RecordFields {
        project: Some(config.project.clone()),
        issue_type: req.category.map(|c| c.to_string()),
        summary: Some(req.summary().unwrap_or_else(|| NO_SUMMARY.to_string())),
        description: rich(&req.content),
        requirement_id: Some(req.req_id.clone()),
        status: None,
        customer_status: req.status_customer.map(|s| s.to_string()),
        asil: req.asil.map(|a| a.to_string()),
        satisfies: req.satisfies().map(String::from),
        review_comments: rich(&req.review_comments),
        customer_comments: rich(&req.customer_comments),
        internal_comments: rich(&req.internal_comments),
        test_levels: Some(req.test_levels.iter().map(|l| l.to_string()).collect()),
        grouping_labels: Some(grouping),
        labels: (!config.labels.is_empty()).then(|| config.labels.clone()),
        fix_versions: Some(
            req.release
                .as_deref()
                .map(|release| {
                    release
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        links: None,
    }
}

/// Keep only the fields belonging to the allowed attributes.
///
/// Content implies summary and description, release implies fix versions,
/// category implies issue type and any grouping attribute implies the whole
/// grouping-label set. Project and labels always pass.
pub fn select_fields(fields: RecordFields, allowed: &BTreeSet<Attribute>) -> RecordFields {
    let has = |attr: Attribute| allowed.contains(&attr);
    let keep = |attr: Attribute, value: Option<String>| value.filter(|_| has(attr));

    RecordFields {
        project: fields.project,
        issue_type: keep(Attribute::Category, fields.issue_type),
        summary: fields
            .summary
            .filter(|_| has(Attribute::Content) || has(Attribute::Summary)),
        description: keep(Attribute::Content, fields.description),
        requirement_id: keep(Attribute::ReqId, fields.requirement_id),
        status: None,
        customer_status: keep(Attribute::StatusCustomer, fields.customer_status),
        asil: keep(Attribute::Asil, fields.asil),
        satisfies: keep(Attribute::Satisfies, fields.satisfies),
        review_comments: keep(Attribute::ReviewComments, fields.review_comments),
        customer_comments: keep(Attribute::CustomerComments, fields.customer_comments),
        internal_comments: keep(Attribute::InternalComments, fields.internal_comments),
        test_levels: fields.test_levels.filter(|_| has(Attribute::TestLevels)),
        grouping_labels: fields
            .grouping_labels
            .filter(|_| allowed.iter().any(Attribute::is_grouping)),
        labels: fields.labels,
        fix_versions: fields.fix_versions.filter(|_| has(Attribute::Release)),
        links: None,
    }
}

/// Parse a configured attribute allowlist.
pub fn parse_allowlist(names: &[String]) -> rq_core::Result<BTreeSet<Attribute>> {
    names.iter().map(|name| name.parse()).collect()
}

/// Prefixed grouping labels derived from a requirement's sets.
pub fn grouping_labels(req: &Requirement, unit_template: Option<&str>) -> Vec<String> {
    let units = req
        .units
        .iter()
        .map(|unit| format!("{}{}", UNIT_PREFIX, unit_label(unit, unit_template)));
    let prefixed = |prefix: &'static str, set: &BTreeSet<String>| {
        set.iter()
            .map(move |value| format!("{}{}", prefix, value))
            .collect::<Vec<_>>()
    };

    units
        .chain(prefixed(COMPONENT_PREFIX, &req.components))
        .chain(prefixed(OPTION_PREFIX, &req.optional_flags))
        .chain(prefixed(VARIANT_PREFIX, &req.variants))
        .collect()
}

fn unit_label(unit: &str, template: Option<&str>) -> String {
    match template {
        Some(template) => template.replace("{}", unit),
        None => unit.to_string(),
    }
}

/// Inverse of [`unit_label`]; labels not matching the template are kept whole.
fn unit_from_label(label: &str, template: Option<&str>) -> String {
    let Some((before, after)) = template.and_then(|t| t.split_once("{}")) else {
        return label.to_string();
    };
    label
        .strip_prefix(before)
        .and_then(|rest| rest.strip_suffix(after))
        .filter(|unit| !unit.is_empty())
        .unwrap_or(label)
        .to_string()
}

fn parse_or_warn<T: FromStr>(key: &str, what: &str, value: Option<&str>) -> Option<T> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value, "ignoring unrecognized {}", what);
            None
        }
    }
}
