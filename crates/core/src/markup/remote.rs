// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Translation between the remote wiki dialect and canonical text.
//!
//! Wiki markup is line oriented: consecutive `* ` lines form a list,
//! consecutive lines starting with `|` form a table (`||` marks the head
//! row), everything else is a paragraph line. Inline delimiters are resolved
//! per line in a fixed order: bold `*`, subscript `~`, superscript `^`,
//! italic `_`, strikethrough `-`, then `!name.ext!` images.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::{Tag, BREAK};

/// Inline delimiters in resolution order.
const INLINE: [(char, Tag); 5] = [
    ('*', Tag::Bold),
    ('~', Tag::Sub),
    ('^', Tag::Sup),
    ('_', Tag::Italic),
    ('-', Tag::Strike),
];

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"!([\w-]+\.\w+)!") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

static CANONICAL_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"<xhtml:img>(.*?)</xhtml:img>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?s)<xhtml:table>(.*?)</xhtml:table>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?s)<xhtml:tr>(.*?)</xhtml:tr>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?s)<xhtml:t([hd])>(.*?)</xhtml:t[hd]>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"\s+") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

static LEFTOVER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"</?(?:reqif-)?xhtml[^>]*?/?>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

/// One line-level block of wiki text.
enum Block<'a> {
    Line(&'a str),
    List(Vec<&'a str>),
    Table(Vec<&'a str>),
}

impl Block<'_> {
    /// Lists and tables terminate their own lines when rendered back.
    fn is_self_terminating(&self) -> bool {
        !matches!(self, Block::Line(_))
    }
}

fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();

    for line in text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)) {
        if let Some(item) = line.strip_prefix("* ") {
            if let Some(Block::List(items)) = blocks.last_mut() {
                items.push(item);
            } else {
                blocks.push(Block::List(vec![item]));
            }
        } else if line.trim_start().starts_with('|') {
            if let Some(Block::Table(rows)) = blocks.last_mut() {
                rows.push(line.trim());
            } else {
                blocks.push(Block::Table(vec![line.trim()]));
            }
        } else {
            blocks.push(Block::Line(line));
        }
    }

    blocks
}

/// Convert remote wiki markup into canonical tagged text.
///
/// A delimiter run without a resolvable closing delimiter is left as plain
/// text. Canonical input passes through unchanged.
pub fn to_canonical(text: &str) -> String {
    let blocks = split_blocks(text);
    let mut out = String::with_capacity(text.len() * 2);

    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 && !blocks[idx - 1].is_self_terminating() {
            out.push_str(BREAK);
        }
        match block {
            Block::Line(line) => out.push_str(&convert_inline(line)),
            Block::List(items) => {
                let body: String = items
                    .iter()
                    .map(|item| Tag::ListItem.wrap(&convert_inline(item)))
                    .collect();
                out.push_str(&Tag::List.wrap(&body));
            }
            Block::Table(rows) => out.push_str(&convert_table(rows)),
        }
    }

    out
}

fn convert_inline(text: &str) -> String {
    let mut converted = text.to_string();
    for (delimiter, tag) in INLINE {
        if converted.contains(delimiter) {
            converted = wrap_runs(&converted, delimiter, tag);
        }
    }
    IMAGE_RE
        .replace_all(&converted, |caps: &Captures<'_>| Tag::Image.wrap(&caps[1]))
        .into_owned()
}

fn convert_table(rows: &[&str]) -> String {
    let body: String = rows
        .iter()
        .map(|row| {
            let (cells, tag): (Vec<&str>, Tag) = if let Some(inner) = row.strip_prefix("||") {
                let inner = inner.strip_suffix("||").unwrap_or(inner);
                (inner.split("||").collect(), Tag::HeaderCell)
            } else {
                let inner = row.strip_prefix('|').unwrap_or(row);
                let inner = inner.strip_suffix('|').unwrap_or(inner);
                (inner.split('|').collect(), Tag::Cell)
            };
            let cells: String = cells
                .into_iter()
                .map(|cell| tag.wrap(&convert_inline(&WHITESPACE_RE.replace_all(cell, " "))))
                .collect();
            Tag::TableRow.wrap(&cells)
        })
        .collect();
    Tag::Table.wrap(&body)
}

fn opens_after(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | '[' | '{' | '"' | '\'' | '>' | ',' | ';' | ':' | '.' | '!' | '?')
}

fn closes_before(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '!' | '?' | ':' | ',' | ';' | ')' | ']' | '}' | '"' | '\'' | '<')
}

/// Replace `delimiter`-wrapped runs with the tag pair.
///
/// An opening delimiter sits at the start of the text or after whitespace or
/// punctuation and is followed by a non-space character. The body is the
/// shortest non-empty run up to a delimiter that follows a non-space
/// character and precedes whitespace, punctuation or the end of the text.
fn wrap_runs(text: &str, delimiter: char, tag: Tag) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == delimiter && opens_at(&chars, i, delimiter) {
            if let Some(close) = find_close(&chars, i, delimiter) {
                out.push_str(tag.open());
                out.extend(&chars[i + 1..close]);
                out.push_str(tag.close());
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

fn opens_at(chars: &[char], i: usize, delimiter: char) -> bool {
    let left_ok = i == 0 || opens_after(chars[i - 1]);
    let next = chars.get(i + 1);
    left_ok && next.is_some_and(|&c| !c.is_whitespace() && c != delimiter)
}

fn find_close(chars: &[char], open: usize, delimiter: char) -> Option<usize> {
    (open + 2..chars.len()).find(|&j| {
        chars[j] == delimiter
            && !chars[j - 1].is_whitespace()
            && chars.get(j + 1).map_or(true, |&c| closes_before(c))
    })
}

/// Convert canonical tagged text into remote wiki markup.
///
/// Image tags are only rewritten when their name is a key of
/// `attachment_hashes`; other image references stay tagged until the
/// attachment exists remotely. Unknown XHTML tags are stripped last.
pub fn to_remote(text: &str, attachment_hashes: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();

    for (delimiter, tag) in INLINE {
        let delimiter = delimiter.to_string();
        out = out
            .replace(tag.open(), &delimiter)
            .replace(tag.close(), &delimiter);
    }

    out = out
        .replace(Tag::ListItem.open(), "* ")
        .replace(Tag::ListItem.close(), "\n")
        .replace(Tag::List.open(), "")
        .replace(Tag::List.close(), "");

    out = CANONICAL_IMAGE_RE
        .replace_all(&out, |caps: &Captures<'_>| {
            if attachment_hashes.contains_key(&caps[1]) {
                format!("!{}!", &caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    out = TABLE_RE
        .replace_all(&out, |caps: &Captures<'_>| render_table(&caps[1]))
        .into_owned();

    out = out.replace(BREAK, "\n");

    out = LEFTOVER_TAG_RE
        .replace_all(&out, |caps: &Captures<'_>| {
            let tag = &caps[0];
            if tag == Tag::Image.open() || tag == Tag::Image.close() {
                tag.to_string()
            } else {
                String::new()
            }
        })
        .into_owned();

    out.trim().to_string()
}

fn render_table(body: &str) -> String {
    let mut table = String::new();
    for row in ROW_RE.captures_iter(body) {
        let mut header = false;
        let cells: Vec<String> = CELL_RE
            .captures_iter(&row[1])
            .map(|cell| {
                header |= &cell[1] == "h";
                let flat = cell[2].replace(BREAK, " ");
                WHITESPACE_RE.replace_all(&flat, " ").into_owned()
            })
            .collect();
        let separator = if header { "||" } else { "|" };
        table.push_str(separator);
        table.push_str(&cells.join(separator));
        table.push_str(separator);
        table.push('\n');
    }
    table
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
