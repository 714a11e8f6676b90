// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The requirement entity and its enumerated attribute types.
//!
//! Every record carries two orthogonal flag sets: [`InternalStatus`] marks
//! which reconciliation action the record needs, [`Attribute`] entries in
//! `updated_fields` mark which fields changed since the last sync.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::markup::{self, BREAK};
use crate::natural::natural_cmp;
use crate::summary::{cap_reference_list, summarize, MAX_SATISFIES_LENGTH, MAX_SUMMARY_LENGTH};

/// Content-addressed image name → source location of the image.
pub type AttachmentHashes = BTreeMap<String, String>;

/// Enum whose storage spelling is a human-readable label.
///
/// Parsing is case-insensitive; serde uses the label.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $invalid:ident,
        { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the label used in storage and display.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Comma-separated list of labels, for error hints.
            pub fn valid_values() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| Error::$invalid(s.to_string()))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let label = String::deserialize(deserializer)?;
                label.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

labelled_enum! {
    /// Kind of requirement record.
    Category, InvalidCategory, {
        Functional => "Functional Requirement",
        NonFunctional => "NonFunctional Requirement",
        Heading => "Heading",
        Information => "Information",
        Interface => "Interface",
        DesignDecision => "Design Decision",
        Custom => "Custom Type",
    }
}

labelled_enum! {
    /// Internal review status.
    Status, InvalidStatus, {
        InWork => "In Work",
        InReview => "In Review",
        New => "New",
        Accepted => "Accepted",
        Rejected => "Rejected",
        UnclearExternal => "Unclear External",
        UnclearInternal => "Unclear Internal",
    }
}

labelled_enum! {
    /// Customer-facing status.
    CustomerStatus, InvalidCustomerStatus, {
        InWork => "In Work",
        InReview => "In Review",
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

labelled_enum! {
    /// Automotive safety integrity level, including decomposed levels.
    Asil, InvalidAsil, {
        Qm => "QM",
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        QmA => "QM(A)",
        AA => "A(A)",
        QmB => "QM(B)",
        AB => "A(B)",
        BB => "B(B)",
        QmC => "QM(C)",
        AC => "A(C)",
        BC => "B(C)",
        CC => "C(C)",
        QmD => "QM(D)",
        AD => "A(D)",
        BD => "B(D)",
        CD => "C(D)",
        DD => "D(D)",
    }
}

labelled_enum! {
    /// Level at which a requirement is verified.
    TestLevel, InvalidTestLevel, {
        Unit => "Unit Test",
        Integration => "Integration Test",
        System => "System Test",
        Acceptance => "Acceptance Test",
    }
}

/// Reconciliation action a record needs against the remote system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalStatus {
    Created,
    Moved,
    Updated,
    ChildrenUpdated,
    Deleted,
}

impl InternalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternalStatus::Created => "created",
            InternalStatus::Moved => "moved",
            InternalStatus::Updated => "updated",
            InternalStatus::ChildrenUpdated => "children_updated",
            InternalStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for InternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One variant per synchronized requirement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    ReqId,
    Category,
    Status,
    Content,
    Summary,
    Asil,
    Links,
    Satisfies,
    Components,
    Units,
    TestLevels,
    StatusCustomer,
    CustomerComments,
    ReviewComments,
    InternalComments,
    Release,
    Variants,
    OptionalFlags,
    AttachmentHashes,
}

impl Attribute {
    pub const ALL: [Attribute; 19] = [
        Attribute::ReqId,
        Attribute::Category,
        Attribute::Status,
        Attribute::Content,
        Attribute::Summary,
        Attribute::Asil,
        Attribute::Links,
        Attribute::Satisfies,
        Attribute::Components,
        Attribute::Units,
        Attribute::TestLevels,
        Attribute::StatusCustomer,
        Attribute::CustomerComments,
        Attribute::ReviewComments,
        Attribute::InternalComments,
        Attribute::Release,
        Attribute::Variants,
        Attribute::OptionalFlags,
        Attribute::AttachmentHashes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::ReqId => "req_id",
            Attribute::Category => "category",
            Attribute::Status => "status",
            Attribute::Content => "content",
            Attribute::Summary => "summary",
            Attribute::Asil => "asil",
            Attribute::Links => "links",
            Attribute::Satisfies => "satisfies",
            Attribute::Components => "components",
            Attribute::Units => "units",
            Attribute::TestLevels => "test_levels",
            Attribute::StatusCustomer => "status_customer",
            Attribute::CustomerComments => "customer_comments",
            Attribute::ReviewComments => "review_comments",
            Attribute::InternalComments => "internal_comments",
            Attribute::Release => "release",
            Attribute::Variants => "variants",
            Attribute::OptionalFlags => "optional_flags",
            Attribute::AttachmentHashes => "attachment_hashes",
        }
    }

    /// Grouping-label sets folded into the remote label field.
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            Attribute::Units | Attribute::OptionalFlags | Attribute::Variants | Attribute::Components
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = Error;

    /// Accepts `snake_case` names, optionally with a leading underscore.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches('_').to_lowercase();
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == name)
            .ok_or_else(|| Error::UnknownAttribute(s.to_string()))
    }
}

/// A single requirement record.
///
/// Identity is the `req_id`: equality and hashing use it alone, ordering is
/// the natural (numeric-aware) order of ids. Rich-text fields hold canonical
/// markup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    pub req_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_customer: Option<CustomerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asil: Option<Asil>,
    /// Outward reference ids.
    pub links: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    satisfies: Option<String>,
    pub components: BTreeSet<String>,
    pub units: BTreeSet<String>,
    pub variants: BTreeSet<String>,
    pub optional_flags: BTreeSet<String>,
    /// Remote grouping labels carrying none of the derived-group prefixes.
    /// Kept so that rewriting the label set leaves them in place.
    pub remote_labels: BTreeSet<String>,
    pub test_levels: BTreeSet<TestLevel>,
    /// Comma-separated version labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub attachment_hashes: AttachmentHashes,
    pub internal_status: BTreeSet<InternalStatus>,
    pub updated_fields: BTreeSet<Attribute>,
}

impl Requirement {
    pub fn new(req_id: impl Into<String>) -> Self {
        Requirement {
            req_id: req_id.into(),
            ..Default::default()
        }
    }

    /// Explicit summary, or one derived from the content.
    pub fn summary(&self) -> Option<String> {
        match (&self.summary, &self.content) {
            (Some(summary), _) if !summary.is_empty() => Some(summary.clone()),
            (_, Some(content)) if !content.is_empty() => {
                Some(summarize(content, MAX_SUMMARY_LENGTH))
            }
            _ => None,
        }
    }

    /// Set an explicit summary, capped at the summary length.
    pub fn set_summary(&mut self, summary: Option<&str>) {
        self.summary = summary
            .filter(|s| !s.is_empty())
            .map(|s| summarize(s, MAX_SUMMARY_LENGTH));
    }

    pub fn satisfies(&self) -> Option<&str> {
        self.satisfies.as_deref()
    }

    /// Set the comma-joined reference list, capped without splitting a reference.
    pub fn set_satisfies(&mut self, satisfies: Option<&str>) {
        self.satisfies = satisfies
            .map(|s| cap_reference_list(s, MAX_SATISFIES_LENGTH))
            .filter(|s| !s.is_empty());
    }

    /// Content without markup; line breaks become newlines.
    pub fn raw_content(&self) -> Option<String> {
        self.content.as_deref().map(raw_text)
    }

    pub fn mark(&mut self, status: InternalStatus) {
        self.internal_status.insert(status);
    }

    pub fn has(&self, status: InternalStatus) -> bool {
        self.internal_status.contains(&status)
    }

    /// Flag a field as changed. Also marks the record UPDATED.
    pub fn set_updated(&mut self, attribute: Attribute) {
        self.updated_fields.insert(attribute);
        self.internal_status.insert(InternalStatus::Updated);
    }

    pub fn is_updated(&self, attribute: Attribute) -> bool {
        self.updated_fields.contains(&attribute)
    }

    /// All link targets: explicit links plus the entries of `satisfies`.
    pub fn link_targets(&self) -> BTreeSet<String> {
        let mut targets = self.links.clone();
        if let Some(satisfies) = &self.satisfies {
            targets.extend(
                satisfies
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
        targets
    }

    /// Plain-text rendering of one attribute, for listings and exchange output.
    pub fn attribute_text(&self, attribute: Attribute) -> Option<String> {
        fn joined<T: fmt::Display>(set: &BTreeSet<T>) -> Option<String> {
            if set.is_empty() {
                None
            } else {
                Some(set.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
        }

        match attribute {
            Attribute::ReqId => Some(self.req_id.clone()),
            Attribute::Category => self.category.map(|v| v.to_string()),
            Attribute::Status => self.status.map(|v| v.to_string()),
            Attribute::Content => self.content.clone(),
            Attribute::Summary => self.summary(),
            Attribute::Asil => self.asil.map(|v| v.to_string()),
            Attribute::Links => joined(&self.links),
            Attribute::Satisfies => self.satisfies.clone(),
            Attribute::Components => joined(&self.components),
            Attribute::Units => joined(&self.units),
            Attribute::TestLevels => joined(&self.test_levels),
            Attribute::StatusCustomer => self.status_customer.map(|v| v.to_string()),
            Attribute::CustomerComments => self.customer_comments.clone(),
            Attribute::ReviewComments => self.review_comments.clone(),
            Attribute::InternalComments => self.internal_comments.clone(),
            Attribute::Release => self.release.clone(),
            Attribute::Variants => joined(&self.variants),
            Attribute::OptionalFlags => joined(&self.optional_flags),
            Attribute::AttachmentHashes => {
                if self.attachment_hashes.is_empty() {
                    None
                } else {
                    Some(
                        self.attachment_hashes
                            .keys()
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                }
            }
        }
    }

    /// Forget all pending reconciliation state.
    pub fn clear_sync_state(&mut self) {
        self.internal_status.clear();
        self.updated_fields.clear();
    }
}

/// Strip markup from canonical text, keeping line breaks as newlines.
pub fn raw_text(text: &str) -> String {
    markup::strip_tags(&text.replace(BREAK, "\n"))
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.req_id == other.req_id
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.req_id.hash(state);
    }
}

impl PartialOrd for Requirement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Requirement {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.req_id, &other.req_id).then_with(|| self.req_id.cmp(&other.req_id))
    }
}

#[cfg(test)]
#[path = "requirement_tests.rs"]
mod tests;
