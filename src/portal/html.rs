//! Scraping helpers for the mod portal's fixed page layout.
//!
//! Only the handful of elements the portal actually renders are recognized:
//! `dd#mod-info-name`, `dd#mod-info-size`, `select#mod-version`,
//! `a#mod-download-link` and the dependency anchors.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static DD_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<dd\b([^>]*)>(.*?)</dd\s*>"));
static SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<select\b([^>]*)>(.*?)</select\s*>"));
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<option\b([^>]*)>(.*?)</option\s*>"));
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));

/// Kind of dependency anchor on the dependencies page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DependencyAnchor {
    /// Link text (the dependency's mod name).
    pub name: String,
    pub href: Option<String>,
    pub is_optional: bool,
}

/// Returns the value of attribute `name` from a raw attribute string.
fn attr_value(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .map(|m| decode_entities(m.as_str()))
    })
}

fn has_id(attrs: &str, id: &str) -> bool {
    attr_value(attrs, "id").is_some_and(|value| value.trim() == id)
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr_value(attrs, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Decodes the handful of entities the portal emits.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Strips markup from an element body and collapses whitespace.
fn inner_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of `<dd id="mod-info-name">`.
pub(crate) fn extract_mod_name(html: &str) -> Option<String> {
    DD_RE
        .captures_iter(html)
        .find(|caps| has_id(&caps[1], "mod-info-name"))
        .map(|caps| inner_text(&caps[2]))
        .filter(|name| !name.is_empty())
}

/// Latest version from `<select id="mod-version">`.
///
/// The option whose text contains `(last)` wins; otherwise the first option.
/// The option's `value` attribute is preferred over its text.
pub(crate) fn extract_latest_version(html: &str) -> Option<String> {
    let select = SELECT_RE
        .captures_iter(html)
        .find(|caps| has_id(&caps[1], "mod-version"))?;
    let body = select.get(2)?.as_str();

    let options: Vec<(String, String)> = OPTION_RE
        .captures_iter(body)
        .map(|caps| {
            let text = inner_text(&caps[2]);
            let value = attr_value(&caps[1], "value")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| text.replace("(last)", "").trim().to_string());
            (value, text)
        })
        .filter(|(value, _)| !value.is_empty())
        .collect();

    options
        .iter()
        .find(|(_, text)| text.contains("(last)"))
        .or_else(|| options.first())
        .map(|(value, _)| value.clone())
}

/// Byte size from `<dd id="mod-info-size" data-bytes="N">`.
pub(crate) fn extract_size(html: &str) -> Option<u64> {
    DD_RE
        .captures_iter(html)
        .find(|caps| has_id(&caps[1], "mod-info-size"))
        .and_then(|caps| attr_value(&caps[1], "data-bytes"))
        .and_then(|bytes| bytes.trim().parse().ok())
}

/// Absolute href of `<a id="mod-download-link">`, if present.
pub(crate) fn extract_download_link(html: &str, page_url: &Url) -> Option<String> {
    ANCHOR_RE
        .captures_iter(html)
        .find(|caps| has_id(&caps[1], "mod-download-link"))
        .and_then(|caps| attr_value(&caps[1], "href"))
        .and_then(|href| absolutize_url(href.trim(), page_url))
}

/// Required and optional dependency anchors, in document order.
pub(crate) fn extract_dependency_anchors(html: &str) -> Vec<DependencyAnchor> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = &caps[1];
            let is_optional = if has_class(attrs, "mod-dependencies-required") {
                false
            } else if has_class(attrs, "mod-dependencies-optional") {
                true
            } else {
                return None;
            };
            let name = inner_text(&caps[2]);
            if name.is_empty() {
                return None;
            }
            Some(DependencyAnchor {
                name,
                href: attr_value(attrs, "href"),
                is_optional,
            })
        })
        .collect()
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or `https://`;
/// normalizes `//...` to `https:...`; otherwise joins with `base_url`.
#[must_use]
pub(crate) fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}
