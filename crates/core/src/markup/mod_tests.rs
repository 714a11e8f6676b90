// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn closing_tags_follow_the_slash_convention() {
    for tag in Tag::ALL {
        assert_eq!(tag.close(), tag.open().replacen('<', "</", 1), "{:?}", tag);
    }
}

#[test]
fn canonical_spellings_are_unique() {
    let mut spellings: Vec<&str> = Tag::ALL.iter().map(|t| t.open()).collect();
    spellings.push(BREAK);
    let count = spellings.len();
    spellings.sort();
    spellings.dedup();
    assert_eq!(spellings.len(), count);
}

#[test]
fn recognizes_canonical_tags_only() {
    assert!(is_canonical_tag("<xhtml:b>"));
    assert!(is_canonical_tag("</xhtml:td>"));
    assert!(is_canonical_tag(BREAK));
    assert!(!is_canonical_tag("<xhtml:div>"));
    assert!(!is_canonical_tag("<reqif-xhtml:b>"));
}

#[test]
fn strip_tags_leaves_text() {
    assert_eq!(
        strip_tags("<xhtml:b>Stop</xhtml:b><xhtml:br/>now").trim(),
        "Stop  now"
    );
}

#[test]
fn image_names_in_order() {
    let text = "a <xhtml:img>abc.png</xhtml:img> b <xhtml:img>def.jpg</xhtml:img>";
    assert_eq!(image_names(text), vec!["abc.png", "def.jpg"]);
    assert!(image_names("<xhtml:img>open").is_empty());
}
