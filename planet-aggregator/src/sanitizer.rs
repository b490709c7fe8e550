use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Elements whose text must not survive when the element itself is dropped.
const NON_TEXT_TAGS: [&str; 5] = ["script", "style", "textarea", "noscript", "option"];

/// Attributes that carry a url and are subject to the scheme allow-list.
const URL_ATTRIBUTES: [&str; 3] = ["href", "src", "cite"];

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9.+\-]*):").expect("scheme pattern is valid"));

/// Allow-list governing what survives sanitization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    pub allowed_tags: Vec<String>,
    /// Tag name to permitted attribute names. `"*"` applies to every tag.
    pub allowed_attributes: HashMap<String, Vec<String>>,
    pub self_closing: Vec<String>,
    pub allowed_schemes: Vec<String>,
    pub allow_protocol_relative: bool,
    pub lower_case_tags: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        let tags = [
            "h3", "h4", "h5", "h6", "blockquote", "p", "a", "ul", "ol", "nl", "li", "b", "i",
            "strong", "em", "strike", "code", "hr", "br", "div", "table", "thead", "caption",
            "tbody", "tr", "th", "td", "pre", "img",
        ];
        let mut allowed_attributes = HashMap::new();
        allowed_attributes.insert(
            "a".to_string(),
            vec!["href".to_string(), "name".to_string(), "target".to_string()],
        );
        allowed_attributes.insert("img".to_string(), vec!["src".to_string()]);

        Self {
            allowed_tags: tags.iter().map(|t| t.to_string()).collect(),
            allowed_attributes,
            self_closing: ["img", "br", "hr", "area", "base", "basefont", "input", "link", "meta"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            allowed_schemes: ["http", "https", "ftp", "mailto"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_protocol_relative: true,
            lower_case_tags: true,
        }
    }
}

impl SecurityPolicy {
    fn tag_name(&self, name: &str) -> String {
        if self.lower_case_tags {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.iter().any(|t| self.tag_name(t) == tag)
    }

    pub fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        let listed = |key: &str| {
            self.allowed_attributes
                .get(key)
                .map(|names| names.iter().any(|n| n.eq_ignore_ascii_case(attribute)))
                .unwrap_or(false)
        };
        listed(tag) || listed("*")
    }

    pub fn is_self_closing(&self, tag: &str) -> bool {
        self.self_closing.iter().any(|t| self.tag_name(t) == tag)
    }

    /// Whether a url value may be emitted under this policy.
    pub fn allows_url(&self, value: &str) -> bool {
        let compact = compact_url(value);

        if let Some(caps) = SCHEME.captures(&compact) {
            let scheme = caps[1].to_ascii_lowercase();
            return self
                .allowed_schemes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&scheme));
        }

        if compact.starts_with("//") {
            return self.allow_protocol_relative;
        }

        true
    }
}

/// Rewritable tag kinds, selected by tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteKind {
    Image,
    Anchor,
    Other,
}

impl RewriteKind {
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "img" => RewriteKind::Image,
            "a" => RewriteKind::Anchor,
            _ => RewriteKind::Other,
        }
    }

    /// The attribute this kind rewrites, if any.
    pub fn url_attribute(self) -> Option<&'static str> {
        match self {
            RewriteKind::Image => Some("src"),
            RewriteKind::Anchor => Some("href"),
            RewriteKind::Other => None,
        }
    }

    /// Resolve `value` against the originating site.
    ///
    /// Rules, first match wins:
    /// 1. `#frag` on an anchor becomes `post_link#frag`
    /// 2. `/path` becomes `host/path`
    /// 3. `//x`, `http://x`, `https://x` (or any other explicit scheme) stay as they are
    /// 4. anything else is a bare relative path and becomes `host/value`
    pub fn rewrite(self, value: &str, host: &str, post_link: &str) -> String {
        if self == RewriteKind::Other || value.is_empty() {
            return value.to_string();
        }

        if self == RewriteKind::Anchor && value.starts_with('#') {
            return format!("{}{}", post_link, value);
        }

        if value.starts_with('/') && !value.starts_with("//") {
            return format!("{}{}", host, value);
        }

        if is_absolute_url(value) {
            return value.to_string();
        }

        format!("{}/{}", host, value)
    }
}

/// True for protocol-relative urls and urls carrying a scheme.
pub fn is_absolute_url(value: &str) -> bool {
    value.starts_with("//")
        || value.starts_with("http://")
        || value.starts_with("https://")
        || SCHEME.is_match(&compact_url(value))
}

// Browsers ignore embedded whitespace and control characters, so `java\tscript:` still runs.
fn compact_url(value: &str) -> String {
    value.chars().filter(|c| *c > ' ').collect()
}

/// Site base used for relative urls: the channel link minus one trailing slash.
pub fn host_from_channel(link: &str) -> &str {
    link.strip_suffix('/').unwrap_or(link)
}

/// Strip everything `policy` does not allow from `html` and make `img`/`a` urls absolute.
///
/// Never fails: markup the parser cannot make sense of is dropped.
pub fn sanitize(html: &str, host: &str, post_link: &str, policy: &SecurityPolicy) -> String {
    let fragment = Html::parse_fragment(html);
    let mut writer = FragmentWriter {
        policy,
        host,
        post_link,
        out: String::with_capacity(html.len()),
        dropped: 0,
    };

    writer.write_children(fragment.root_element());

    if writer.dropped > 0 {
        debug!("Dropped {} disallowed elements from {}", writer.dropped, post_link);
    }

    writer.out
}

struct FragmentWriter<'a> {
    policy: &'a SecurityPolicy,
    host: &'a str,
    post_link: &'a str,
    out: String,
    dropped: usize,
}

impl<'a> FragmentWriter<'a> {
    fn write_children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => {
                    self.out.push_str(&html_escape::encode_text(&**text));
                }
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.write_element(element);
                    }
                }
                // comments, doctypes and processing instructions never survive
                _ => {}
            }
        }
    }

    fn write_element(&mut self, element: ElementRef<'_>) {
        let tag = self.policy.tag_name(element.value().name());

        if !self.policy.allows_tag(&tag) {
            self.dropped += 1;
            if !NON_TEXT_TAGS.contains(&tag.as_str()) {
                self.write_children(element);
            }
            return;
        }

        let kind = RewriteKind::for_tag(&tag);
        let rewritten = kind.url_attribute();

        self.out.push('<');
        self.out.push_str(&tag);

        for (name, value) in element.value().attrs() {
            let name = name.to_ascii_lowercase();
            if !self.policy.allows_attribute(&tag, &name) {
                continue;
            }

            let value = if rewritten == Some(name.as_str()) {
                kind.rewrite(value, self.host, self.post_link)
            } else {
                value.to_string()
            };

            if URL_ATTRIBUTES.contains(&name.as_str()) && !self.policy.allows_url(&value) {
                debug!("Dropped {}[{}] with disallowed url {}", tag, name, value);
                continue;
            }

            self.out.push(' ');
            self.out.push_str(&name);
            self.out.push_str("=\"");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(&value));
            self.out.push('"');
        }

        if self.policy.is_self_closing(&tag) {
            self.out.push_str(" />");
            self.write_children(element);
            return;
        }

        self.out.push('>');
        self.write_children(element);
        self.out.push_str("</");
        self.out.push_str(&tag);
        self.out.push('>');
    }
}
