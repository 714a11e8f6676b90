// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rich-text translation between the three text dialects.
//!
//! Requirement text is stored in a canonical tagged form. The [`remote`]
//! module converts it to and from the ticket system's wiki markup, the
//! [`exchange`] module to and from namespaced XHTML fragments used in
//! exchange documents.
//!
//! Every canonical tag has exactly one spelling. The closing form of a tag
//! is its opening form with `<` replaced by `</`; the line break has no
//! closing form.

use regex::Regex;
use std::sync::LazyLock;

pub mod exchange;
pub mod remote;

/// Canonical line break.
pub const BREAK: &str = "<xhtml:br/>";

/// Paired canonical tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Bold,
    List,
    ListItem,
    Sub,
    Sup,
    Italic,
    Strike,
    Image,
    Table,
    TableRow,
    HeaderCell,
    Cell,
}

impl Tag {
    pub const ALL: [Tag; 12] = [
        Tag::Bold,
        Tag::List,
        Tag::ListItem,
        Tag::Sub,
        Tag::Sup,
        Tag::Italic,
        Tag::Strike,
        Tag::Image,
        Tag::Table,
        Tag::TableRow,
        Tag::HeaderCell,
        Tag::Cell,
    ];

    pub const fn open(self) -> &'static str {
        match self {
            Tag::Bold => "<xhtml:b>",
            Tag::List => "<xhtml:ul>",
            Tag::ListItem => "<xhtml:li>",
            Tag::Sub => "<xhtml:sub>",
            Tag::Sup => "<xhtml:sup>",
            Tag::Italic => "<xhtml:i>",
            Tag::Strike => "<xhtml:del>",
            Tag::Image => "<xhtml:img>",
            Tag::Table => "<xhtml:table>",
            Tag::TableRow => "<xhtml:tr>",
            Tag::HeaderCell => "<xhtml:th>",
            Tag::Cell => "<xhtml:td>",
        }
    }

    pub const fn close(self) -> &'static str {
        match self {
            Tag::Bold => "</xhtml:b>",
            Tag::List => "</xhtml:ul>",
            Tag::ListItem => "</xhtml:li>",
            Tag::Sub => "</xhtml:sub>",
            Tag::Sup => "</xhtml:sup>",
            Tag::Italic => "</xhtml:i>",
            Tag::Strike => "</xhtml:del>",
            Tag::Image => "</xhtml:img>",
            Tag::Table => "</xhtml:table>",
            Tag::TableRow => "</xhtml:tr>",
            Tag::HeaderCell => "</xhtml:th>",
            Tag::Cell => "</xhtml:td>",
        }
    }

    /// Wrap `body` in this tag pair.
    pub fn wrap(self, body: &str) -> String {
        format!("{}{}{}", self.open(), body, self.close())
    }
}

/// Returns true if `tag` is one of the canonical spellings (open, close or break).
pub fn is_canonical_tag(tag: &str) -> bool {
    tag == BREAK || Tag::ALL.iter().any(|t| t.open() == tag || t.close() == tag)
}

static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"<[^>]*>") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

/// Remove all markup, keeping only the text. Line breaks become spaces.
pub fn strip_tags(text: &str) -> String {
    ANY_TAG_RE.replace_all(text, " ").into_owned()
}

/// Content-addressed image names referenced by canonical image tags.
pub fn image_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(Tag::Image.open()) {
        let after = &rest[start + Tag::Image.open().len()..];
        let Some(end) = after.find(Tag::Image.close()) else {
            break;
        };
        names.push(after[..end].to_string());
        rest = &after[end + Tag::Image.close().len()..];
    }
    names
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
