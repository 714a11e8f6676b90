// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Translation between exchange-document XHTML fragments and canonical text.
//!
//! Exchange fragments use namespaced XHTML elements (`xhtml:` or
//! `reqif-xhtml:` prefixed, or bare). Each known element maps 1:1 onto a
//! canonical tag; everything else is stripped.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::{is_canonical_tag, Tag, BREAK};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"<(/?)([A-Za-z][\w.:-]*)([^>]*?)(/?)>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"<[^<>]*>") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"<xhtml:img>(.*?)</xhtml:img>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*"([^"]*)""#) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"\s+") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

const STRIKE_SPAN_OPEN: &str = r#"<xhtml:span style="text-decoration: line-through;">"#;
const STRIKE_SPAN_CLOSE: &str = "</xhtml:span>";

fn element_tag(name: &str) -> Option<Tag> {
    let tag = match name {
        "b" | "strong" => Tag::Bold,
        "i" | "em" => Tag::Italic,
        "sub" => Tag::Sub,
        "sup" => Tag::Sup,
        "ul" | "ol" => Tag::List,
        "li" => Tag::ListItem,
        "del" | "s" | "strike" => Tag::Strike,
        "table" => Tag::Table,
        "tr" => Tag::TableRow,
        "th" => Tag::HeaderCell,
        "td" => Tag::Cell,
        _ => return None,
    };
    Some(tag)
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// Value of attribute `name`, matched on its local name.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTRIBUTE_RE
        .captures_iter(attrs)
        .find(|caps| local_name(&caps[1]) == name)
        .map(|caps| decode_entities(&caps[2]))
}

/// OLE objects carry a rendered `.png` preview next to them.
fn preview_path(data: &str) -> String {
    match data.strip_suffix(".ole") {
        Some(stem) => format!("{}.png", stem),
        None => data.to_string(),
    }
}

/// Convert an exchange XHTML fragment into canonical text.
///
/// `resolve_image` receives the `data` path of each outermost `object`
/// element and returns the content-addressed image name, or `None` to drop
/// the reference. Fallback content nested inside objects is discarded.
pub fn to_canonical<F>(fragment: &str, mut resolve_image: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(fragment.len());
    // One entry per open span: whether it opened a strikethrough.
    let mut spans: Vec<bool> = Vec::new();
    let mut object_depth = 0usize;
    let mut last = 0;

    for caps in TAG_RE.captures_iter(fragment) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if object_depth == 0 {
            push_text(&mut out, &fragment[last..whole.start()]);
        }
        last = whole.end();

        let closing = !caps[1].is_empty();
        let self_closing = !caps[4].is_empty();
        let name = local_name(&caps[2]).to_ascii_lowercase();

        if name == "object" {
            if closing {
                object_depth = object_depth.saturating_sub(1);
                continue;
            }
            if object_depth == 0 {
                let image = attribute(&caps[3], "data").and_then(|d| resolve_image(&preview_path(&d)));
                if let Some(image) = image {
                    out.push_str(&Tag::Image.wrap(&image));
                }
            }
            if !self_closing {
                object_depth += 1;
            }
            continue;
        }
        if object_depth > 0 {
            continue;
        }

        match name.as_str() {
            "br" if !closing => out.push_str(BREAK),
            "span" if closing => {
                if spans.pop() == Some(true) {
                    out.push_str(Tag::Strike.close());
                }
            }
            "span" if !self_closing => {
                let strike =
                    attribute(&caps[3], "style").is_some_and(|s| s.contains("line-through"));
                if strike {
                    out.push_str(Tag::Strike.open());
                }
                spans.push(strike);
            }
            _ => {
                if let Some(tag) = element_tag(&name).filter(|_| !self_closing) {
                    out.push_str(if closing { tag.close() } else { tag.open() });
                }
            }
        }
    }
    if object_depth == 0 {
        push_text(&mut out, &fragment[last..]);
    }

    out.trim().to_string()
}

/// Append a text run, collapsing whitespace. Indentation between elements
/// (whitespace-only runs spanning a newline) is dropped.
fn push_text(out: &mut String, raw: &str) {
    if raw.is_empty() || (raw.trim().is_empty() && raw.contains('\n')) {
        return;
    }
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let decoded = decode_entities(&collapsed);
    if out.ends_with(' ') && decoded.starts_with(' ') {
        out.push_str(&decoded[1..]);
    } else {
        out.push_str(&decoded);
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn mime_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Convert canonical text into an exchange XHTML fragment.
///
/// Images become `object` elements pointing at their source location from
/// `attachment_hashes` (the image name itself when unknown). Newlines become
/// line breaks and bare text is escaped.
pub fn to_exchange(text: &str, attachment_hashes: &BTreeMap<String, String>) -> String {
    let text = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;

    for caps in IMAGE_RE.captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        encode_segment(&mut out, &text[last..whole.start()]);
        let name = &caps[1];
        let source = attachment_hashes
            .get(name)
            .map_or(name, String::as_str)
            .replace('\\', "/");
        out.push_str(&format!(
            r#"<xhtml:object data="{}" type="{}"/>"#,
            escape(&source).replace('"', "&quot;"),
            mime_type(&source)
        ));
        last = whole.end();
    }
    encode_segment(&mut out, &text[last..]);

    out
}

fn encode_segment(out: &mut String, segment: &str) {
    let mut last = 0;
    for found in ANY_TAG_RE.find_iter(segment) {
        out.push_str(&escape_text(&segment[last..found.start()]));
        let tag = found.as_str();
        if tag == Tag::Strike.open() {
            out.push_str(STRIKE_SPAN_OPEN);
        } else if tag == Tag::Strike.close() {
            out.push_str(STRIKE_SPAN_CLOSE);
        } else if is_canonical_tag(tag) {
            out.push_str(tag);
        } else {
            out.push_str(&escape_text(tag));
        }
        last = found.end();
    }
    out.push_str(&escape_text(&segment[last..]));
}

fn escape_text(text: &str) -> String {
    escape(text).replace('\n', BREAK)
}

#[cfg(test)]
#[path = "exchange_tests.rs"]
mod tests;
