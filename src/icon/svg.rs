//! Sanitizing and validation of user supplied SVG markup.

use crate::error::QuickMenuError;
use once_cell::sync::Lazy;
use regex::Regex;
use resvg::usvg::{ImageHrefResolver, Options, Tree};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const FALLBACK_VIEW_BOX: &str = "0 0 24 24";

static SCRIPT_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*/>|<script\b[^>]*>.*?</script\s*>").unwrap()
});
static FOREIGN_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<foreignObject\b[^>]*/>|<foreignObject\b[^>]*>.*?</foreignObject\s*>")
        .unwrap()
});
static EVENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});
static JAVASCRIPT_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\s+(?:xlink:)?href\s*=\s*(?:"\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*[^\s>/])"#,
    )
    .unwrap()
});
static ROOT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^<svg\b([^>]*?)(/?)>").unwrap());
static SIZE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+(?:width|height)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>/]+)"#).unwrap()
});
static XMLNS_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\sxmlns\s*=").unwrap());
static VIEW_BOX_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\sviewBox\s*=").unwrap());

/// Drop elements and attributes that can run script.
fn strip_active_content(markup: &str) -> String {
    let out = SCRIPT_ELEMENT.replace_all(markup, "");
    let out = FOREIGN_OBJECT.replace_all(&out, "");
    let out = EVENT_ATTR.replace_all(&out, "");
    JAVASCRIPT_HREF.replace_all(&out, "").into_owned()
}

/// Rewrite the root `<svg>` tag's attributes with `edit`.
fn rewrite_root(markup: &str, edit: impl FnOnce(&str) -> String) -> Option<String> {
    let caps = ROOT_TAG.captures(markup)?;
    let whole = caps.get(0)?;
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let self_closing = caps.get(2).map_or("", |m| m.as_str());
    Some(format!(
        "<svg{}{}>{}",
        edit(attrs),
        self_closing,
        &markup[whole.end()..]
    ))
}

/// Ensure the root carries the SVG namespace and a view box so the markup
/// both parses standalone and scales inside the toggle control.
fn normalize_root(markup: &str) -> Option<String> {
    rewrite_root(markup, |attrs| {
        let mut attrs = attrs.trim_end().to_string();
        if !XMLNS_ATTR.is_match(&attrs) {
            attrs.push_str(&format!(" xmlns=\"{SVG_NS}\""));
        }
        if !VIEW_BOX_ATTR.is_match(&attrs) {
            attrs.push_str(&format!(" viewBox=\"{FALLBACK_VIEW_BOX}\""));
        }
        attrs
    })
}

fn fill_container(markup: &str) -> Option<String> {
    rewrite_root(markup, |attrs| {
        let attrs = SIZE_ATTR.replace_all(attrs, "");
        format!("{} width=\"100%\" height=\"100%\"", attrs.trim_end())
    })
}

/// Parser options for validation only. External `<image>` references are
/// never resolved, so nothing outside the markup is read.
fn validation_options() -> Options<'static> {
    Options {
        image_href_resolver: ImageHrefResolver {
            resolve_data: ImageHrefResolver::default_data_resolver(),
            resolve_string: Box::new(|_: &str, _: &Options| None),
        },
        ..Options::default()
    }
}

/// Produce a render-safe copy of `raw`.
///
/// Fails when the root element is not `<svg>` or the cleaned markup does not
/// parse as an SVG document.
pub fn sanitize(raw: &str) -> Result<String, QuickMenuError> {
    let cleaned = strip_active_content(raw.trim());
    let normalized = normalize_root(&cleaned)
        .ok_or_else(|| QuickMenuError::Configuration("missing <svg> root element".into()))?;

    Tree::from_str(&normalized, &validation_options())
        .map_err(|e| QuickMenuError::Configuration(format!("invalid svg markup: {e}")))?;

    fill_container(&normalized)
        .ok_or_else(|| QuickMenuError::Configuration("missing <svg> root element".into()))
}
