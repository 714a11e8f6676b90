// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn no_images(_: &str) -> Option<String> {
    None
}

#[parameterized(
    bold = { "<xhtml:b>Stop</xhtml:b>", "<xhtml:b>Stop</xhtml:b>" },
    strong = { "<reqif-xhtml:strong>Stop</reqif-xhtml:strong>", "<xhtml:b>Stop</xhtml:b>" },
    bare_em = { "<em>soft</em>", "<xhtml:i>soft</xhtml:i>" },
    ordered_list = {
        "<xhtml:ol><xhtml:li>a</xhtml:li></xhtml:ol>",
        "<xhtml:ul><xhtml:li>a</xhtml:li></xhtml:ul>"
    },
    strike_element = { "<xhtml:s>old</xhtml:s>", "<xhtml:del>old</xhtml:del>" },
    line_break = { "a<xhtml:br/>b", "a<xhtml:br/>b" },
    div_stripped = {
        "<xhtml:div><xhtml:p>Hello</xhtml:p></xhtml:div>",
        "Hello"
    },
    entities = { "a &lt; b &amp;&amp; c &gt; d", "a < b && c > d" },
    whitespace = { "<xhtml:div>  lots   of\n   space </xhtml:div>", "lots of space" },
)]
fn converts_to_canonical(fragment: &str, expected: &str) {
    assert_eq!(to_canonical(fragment, no_images), expected);
}

#[test]
fn strike_span_closes_at_matching_span() {
    let fragment = r#"<xhtml:span style="text-decoration: line-through;">old <xhtml:span>inner</xhtml:span> text</xhtml:span> new"#;
    assert_eq!(
        to_canonical(fragment, no_images),
        "<xhtml:del>old inner text</xhtml:del> new"
    );
}

#[test]
fn indentation_between_elements_is_dropped() {
    let fragment = "<xhtml:ul>\n  <xhtml:li>one</xhtml:li>\n  <xhtml:li>two</xhtml:li>\n</xhtml:ul>";
    assert_eq!(
        to_canonical(fragment, no_images),
        "<xhtml:ul><xhtml:li>one</xhtml:li><xhtml:li>two</xhtml:li></xhtml:ul>"
    );
}

#[test]
fn nested_ole_object_collapses_to_one_image() {
    let fragment = r#"Figure: <xhtml:object type="application/rtf" data="files/diagram.ole"><xhtml:object type="image/png" data="files/diagram.png">fallback text</xhtml:object></xhtml:object> end"#;
    let mut seen = Vec::new();
    let canonical = to_canonical(fragment, |path| {
        seen.push(path.to_string());
        Some("abc123.png".to_string())
    });

    assert_eq!(seen, vec!["files/diagram.png"]);
    assert_eq!(canonical, "Figure: <xhtml:img>abc123.png</xhtml:img> end");
}

#[test]
fn unresolvable_image_is_dropped() {
    let fragment = r#"see <xhtml:object data="missing.png" type="image/png"/>"#;
    assert_eq!(to_canonical(fragment, no_images), "see");
}

#[test]
fn to_exchange_rewrites_strike_and_images() {
    let mut hashes = BTreeMap::new();
    hashes.insert("abc.png".to_string(), r"files\diagram.png".to_string());

    let fragment = to_exchange(
        "<xhtml:del>old</xhtml:del> <xhtml:img>abc.png</xhtml:img>",
        &hashes,
    );
    assert_eq!(
        fragment,
        r#"<xhtml:span style="text-decoration: line-through;">old</xhtml:span> <xhtml:object data="files/diagram.png" type="image/png"/>"#
    );
}

#[test]
fn to_exchange_escapes_text_and_keeps_canonical_tags() {
    let fragment = to_exchange("<xhtml:b>a < b & c</xhtml:b>\nnext", &BTreeMap::new());
    assert_eq!(fragment, "<xhtml:b>a &lt; b &amp; c</xhtml:b><xhtml:br/>next");
}

#[parameterized(
    inline = { "Use <xhtml:b>bold</xhtml:b> and <xhtml:del>strike</xhtml:del>." },
    list = { "<xhtml:ul><xhtml:li>one</xhtml:li><xhtml:li>two</xhtml:li></xhtml:ul>" },
    table = {
        "<xhtml:table><xhtml:tr><xhtml:th>A</xhtml:th></xhtml:tr>\
         <xhtml:tr><xhtml:td>1</xhtml:td></xhtml:tr></xhtml:table>"
    },
    escaped = { "x < y & z" },
    image = { "see <xhtml:img>abc.png</xhtml:img>" },
)]
fn canonical_survives_exchange_round_trip(canonical: &str) {
    let mut hashes = BTreeMap::new();
    hashes.insert("abc.png".to_string(), "img/abc.png".to_string());

    let fragment = to_exchange(canonical, &hashes);
    let back = to_canonical(&fragment, |path| {
        hashes
            .iter()
            .find(|(_, source)| source.as_str() == path)
            .map(|(name, _)| name.clone())
    });
    assert_eq!(back, canonical);
}

#[parameterized(
    plain = { r#" type="image/png" data="a.png""#, "data", Some("a.png") },
    longer_name_ignored = { r#" metadata="x.bin" data="b.png""#, "data", Some("b.png") },
    prefixed = { r#" xhtml:style="text-decoration: line-through""#, "style", Some("text-decoration: line-through") },
    entity_decoded = { r#" data="a&amp;b.png""#, "data", Some("a&b.png") },
    value_not_matched_as_name = { r#" title="data=&quot;x&quot;""#, "data", None },
    absent = { r#" type="image/png""#, "data", None },
)]
fn attribute_lookup(attrs: &str, name: &str, expected: Option<&str>) {
    assert_eq!(attribute(attrs, name).as_deref(), expected);
}
