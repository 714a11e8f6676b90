// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Summary derivation and length capping for requirement text fields.

use crate::markup;

/// Maximum length of a requirement summary.
pub const MAX_SUMMARY_LENGTH: usize = 50;

/// Maximum length of the comma-joined `satisfies` reference list.
pub const MAX_SATISFIES_LENGTH: usize = 250;

const ELLIPSIS: &str = "...";

/// Derive a one-line summary from canonical rich text.
///
/// Tags are stripped, whitespace collapsed, and the result truncated at a
/// word boundary when it exceeds `max_chars`. The returned string is never
/// longer than `max_chars`, including the ellipsis.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let raw = collapse_whitespace(&markup::strip_tags(text));
    truncate_at_word_boundary(raw.trim(), max_chars)
}

/// Cap a comma-joined reference list without splitting a reference.
///
/// References that do not fit are counted into one trailing `+N more`
/// token, which never resolves as a link target.
pub fn cap_reference_list(list: &str, max_chars: usize) -> String {
    let refs: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    let joined = refs.join(", ");
    if joined.chars().count() <= max_chars {
        return joined;
    }

    let mut kept: Vec<&str> = Vec::new();
    for (idx, reference) in refs.iter().enumerate() {
        let remaining = refs.len() - idx - 1;
        let candidate_len = kept
            .iter()
            .chain(std::iter::once(reference))
            .map(|r| r.chars().count() + 2)
            .sum::<usize>();
        let marker_len = format!("+{} more", remaining.max(1)).len();
        if candidate_len + marker_len > max_chars {
            break;
        }
        kept.push(reference);
    }

    let dropped = refs.len() - kept.len();
    let mut out = kept.join(", ");
    if !out.is_empty() {
        out.push_str(", ");
    }
    out.push_str(&format!("+{} more", dropped));
    out
}

/// Truncate text at a word boundary near the given character limit.
/// Breaks at the last space before the limit; a single token longer than
/// the limit is cut hard.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let last_space = (0..=budget).rev().find(|&i| chars[i] == ' ');

    let truncate_at = match last_space {
        Some(pos) if pos > 0 => pos,
        _ => budget,
    };

    let truncated: String = chars[..truncate_at].iter().collect();
    format!("{}{}", truncated.trim_end(), ELLIPSIS)
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
