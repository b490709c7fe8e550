mod common;

use common::init_tracing;
use planet_aggregator::sanitizer::{host_from_channel, is_absolute_url};
use planet_aggregator::{sanitize, RewriteKind, SecurityPolicy};
use std::collections::HashMap;
use tracing::info;

const HOST: &str = "http://alice.example.org";
const POST: &str = "http://alice.example.org/p/1";

fn clean(html: &str) -> String {
    sanitize(html, HOST, POST, &SecurityPolicy::default())
}

#[test]
fn test_host_strips_exactly_one_trailing_slash() {
    assert_eq!(host_from_channel("http://x.com/"), "http://x.com");
    assert_eq!(host_from_channel("http://x.com"), "http://x.com");
    assert_eq!(host_from_channel("http://x.com//"), "http://x.com/");
    assert_eq!(host_from_channel(""), "");
}

#[test]
fn test_rewrite_rules_in_priority_order() {
    let anchor = RewriteKind::Anchor;
    let image = RewriteKind::Image;

    assert_eq!(anchor.rewrite("#comments", HOST, POST), "http://alice.example.org/p/1#comments");
    assert_eq!(anchor.rewrite("/about", HOST, POST), "http://alice.example.org/about");
    assert_eq!(anchor.rewrite("//cdn.example.org/x", HOST, POST), "//cdn.example.org/x");
    assert_eq!(anchor.rewrite("https://other.org/x", HOST, POST), "https://other.org/x");
    assert_eq!(anchor.rewrite("notes/2.html", HOST, POST), "http://alice.example.org/notes/2.html");

    assert_eq!(image.rewrite("/i.png", HOST, POST), "http://alice.example.org/i.png");
    assert_eq!(image.rewrite("http://img.org/i.png", HOST, POST), "http://img.org/i.png");
    assert_eq!(image.rewrite("i.png", HOST, POST), "http://alice.example.org/i.png");
    // anchors only resolve against the post on links
    assert_eq!(image.rewrite("#x", HOST, POST), "http://alice.example.org/#x");

    assert_eq!(RewriteKind::Other.rewrite("/keep", HOST, POST), "/keep");
}

#[test]
fn test_rewrite_kind_lookup() {
    assert_eq!(RewriteKind::for_tag("img"), RewriteKind::Image);
    assert_eq!(RewriteKind::for_tag("a"), RewriteKind::Anchor);
    assert_eq!(RewriteKind::for_tag("p"), RewriteKind::Other);
    assert_eq!(RewriteKind::Image.url_attribute(), Some("src"));
    assert_eq!(RewriteKind::Anchor.url_attribute(), Some("href"));
    assert_eq!(RewriteKind::Other.url_attribute(), None);
}

#[test]
fn test_scheme_urls_are_absolute() {
    assert!(is_absolute_url("mailto:alice@example.org"));
    assert!(is_absolute_url("//cdn.example.org"));
    assert!(!is_absolute_url("docs/page.html"));
    assert!(!is_absolute_url("/root"));
}

#[test]
fn test_relative_image_becomes_absolute() {
    init_tracing();

    let out = clean(r#"<p><img src="/i.png"></p>"#);
    info!("sanitized: {}", out);

    assert_eq!(out, r#"<p><img src="http://alice.example.org/i.png" /></p>"#);
}

#[test]
fn test_anchor_and_relative_links_are_resolved() {
    let out = clean(r##"<a href="#top">top</a> <a href="/about">about</a> <a href="more.html">more</a>"##);

    assert!(out.contains(r#"href="http://alice.example.org/p/1#top""#), "got {}", out);
    assert!(out.contains(r#"href="http://alice.example.org/about""#), "got {}", out);
    assert!(out.contains(r#"href="http://alice.example.org/more.html""#), "got {}", out);
}

#[test]
fn test_absolute_links_untouched() {
    let out = clean(r#"<a href="https://rust-lang.org/">rust</a><img src="//cdn.example.org/x.png">"#);

    assert_eq!(
        out,
        r#"<a href="https://rust-lang.org/">rust</a><img src="//cdn.example.org/x.png" />"#
    );
}

#[test]
fn test_script_is_removed_with_its_text() {
    let out = clean("<p>Hello <script>alert('x')</script>world</p>");

    assert_eq!(out, "<p>Hello world</p>");
    assert!(!out.contains("script"));
    assert!(!out.contains("alert"));
}

#[test]
fn test_disallowed_tags_keep_their_text() {
    let out = clean("<section><span>kept</span></section>");
    assert_eq!(out, "kept");
}

#[test]
fn test_disallowed_attributes_are_dropped() {
    let out = clean(r#"<div onclick="steal()" class="x">hi</div>"#);
    assert_eq!(out, "<div>hi</div>");
}

#[test]
fn test_javascript_urls_are_dropped() {
    let out = clean(r#"<a href="javascript:alert(1)">x</a><a href="java&#9;script:alert(1)">y</a>"#);

    assert_eq!(out, "<a>x</a><a>y</a>");
}

#[test]
fn test_scheme_urls_are_not_glued_to_the_host() {
    let out = clean(r#"<img src="data:image/png;base64,AAAA"><a href="mailto:x@y.org">m</a>"#);

    // data: is not an allowed scheme, mailto: is
    assert_eq!(out, r#"<img /><a href="mailto:x@y.org">m</a>"#);
    assert!(!out.contains(HOST), "got {}", out);

    let mut policy = SecurityPolicy::default();
    policy.allowed_schemes.push("data".to_string());
    let out = sanitize(r#"<img src="data:image/png;base64,AAAA">"#, HOST, POST, &policy);
    assert_eq!(out, r#"<img src="data:image/png;base64,AAAA" />"#);
}

#[test]
fn test_protocol_relative_honours_policy() {
    let mut policy = SecurityPolicy::default();
    policy.allow_protocol_relative = false;

    let out = sanitize(r#"<img src="//cdn.example.org/x.png">"#, HOST, POST, &policy);
    assert_eq!(out, "<img />");

    policy.allow_protocol_relative = true;
    let out = sanitize(r#"<img src="//cdn.example.org/x.png">"#, HOST, POST, &policy);
    assert_eq!(out, r#"<img src="//cdn.example.org/x.png" />"#);
}

#[test]
fn test_wildcard_attributes_apply_to_every_tag() {
    let mut allowed_attributes = HashMap::new();
    allowed_attributes.insert("*".to_string(), vec!["title".to_string()]);
    let policy = SecurityPolicy {
        allowed_tags: vec!["P".to_string(), "em".to_string()],
        allowed_attributes,
        ..SecurityPolicy::default()
    };

    let out = sanitize(r#"<p title="t"><em title="e">x</em></p>"#, HOST, POST, &policy);
    assert_eq!(out, r#"<p title="t"><em title="e">x</em></p>"#);
}

#[test]
fn test_malformed_markup_degrades_gracefully() {
    init_tracing();

    assert_eq!(clean("<p>unclosed <b>bold"), "<p>unclosed <b>bold</b></p>");
    assert_eq!(clean("<<<>>>"), "&lt;&lt;&lt;&gt;&gt;&gt;");
    assert_eq!(clean("text <!-- comment --> more"), "text  more");
    assert_eq!(clean(""), "");
}

#[test]
fn test_sanitize_is_idempotent() {
    let inputs = [
        r#"<p><img src="/i.png"><a href="x.html">x</a> &amp; more</p>"#,
        r##"<table><tr><td><a href="#a">a</a></td></tr></table>"##,
        r#"<div><script>bad()</script><b>ok</b> 1 &lt; 2</div>"#,
    ];

    for input in inputs {
        let once = clean(input);
        let twice = clean(&once);
        assert_eq!(once, twice, "sanitizing {} twice changed it", input);
    }
}
