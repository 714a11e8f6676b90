// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Natural ordering for requirement identifiers.
//!
//! Identifiers are split into alternating text and digit runs. Digit runs
//! compare by numeric value, text runs compare case-insensitively, so
//! `REQ-2 < REQ-10 < REQ-100`.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Text(String),
    /// Digits with leading zeros stripped; compared by length, then lexically.
    Number(Number),
}

#[derive(Debug, PartialEq, Eq)]
struct Number(String);

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key for an identifier.
///
/// The key always starts with a text segment (possibly empty) so that
/// segments of the same kind line up positionally between two keys.
fn natural_key(id: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in id.chars() {
        if c.is_ascii_digit() {
            if digits.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text).to_lowercase()));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                segments.push(number_segment(std::mem::take(&mut digits)));
            }
            text.push(c);
        }
    }

    if !digits.is_empty() {
        segments.push(number_segment(digits));
    } else {
        segments.push(Segment::Text(text.to_lowercase()));
    }
    segments
}

fn number_segment(digits: String) -> Segment {
    let trimmed = digits.trim_start_matches('0');
    Segment::Number(Number(trimmed.to_string()))
}

/// Compare two identifiers in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[cfg(test)]
#[path = "natural_tests.rs"]
mod tests;
