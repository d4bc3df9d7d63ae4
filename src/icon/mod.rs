//! Classification of user supplied icon descriptors.
//!
//! An icon descriptor is whatever the user pasted into the icon field: SVG
//! markup, a URL or file name, a base64 image with or without its `data:`
//! prefix. [`IconResolver`] turns it into a [`RenderDescriptor`] the
//! presentation layer can render without further inspection. Classification
//! is an ordered rule table; the first rule that claims the input wins.

mod embedded;
mod svg;
mod tracker;

pub use embedded::FALLBACK_MIME;
pub use tracker::{IconTicket, IconTracker};

use crate::error::QuickMenuError;
use crate::settings::{DefaultGlyph, IconConfig, IconKind, Settings};
use url::Url;

/// What the presentation layer should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderKind {
    Default { glyph: DefaultGlyph },
    /// Sanitized inline SVG markup.
    Vector { markup: String },
    /// A location the presentation layer loads itself.
    Reference { location: String },
    EmbeddedImage { data_uri: String },
    /// Input that could not be classified; a fallback glyph is shown.
    Unknown { diagnostic: String },
    /// A `Reference` or `EmbeddedImage` that failed to load at runtime.
    LoadFailed { diagnostic: String },
}

impl RenderKind {
    pub fn icon_kind(&self) -> IconKind {
        match self {
            RenderKind::Default { .. } => IconKind::Default,
            RenderKind::Vector { .. } => IconKind::Vector,
            RenderKind::Reference { .. } => IconKind::Reference,
            RenderKind::EmbeddedImage { .. } => IconKind::EmbeddedImage,
            RenderKind::Unknown { .. } | RenderKind::LoadFailed { .. } => IconKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconStyle {
    pub color: String,
    pub hover_color: String,
    pub active_color: String,
    pub size: String,
    pub match_host_colors: bool,
}

impl IconStyle {
    fn from_config(icon: &IconConfig, match_host_colors: bool) -> Self {
        Self {
            color: icon.color.clone(),
            hover_color: icon.hover_color.clone(),
            active_color: icon.active_color.clone(),
            size: icon.size.clone(),
            match_host_colors,
        }
    }
}

impl Default for IconStyle {
    fn default() -> Self {
        Self::from_config(&IconConfig::default(), true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDescriptor {
    pub kind: RenderKind,
    pub style: IconStyle,
}

impl RenderDescriptor {
    pub fn icon_kind(&self) -> IconKind {
        self.kind.icon_kind()
    }
}

type Rule = fn(&str) -> Option<RenderKind>;

/// Classification rules in precedence order. Each rule sees the trimmed
/// input and either claims it or passes.
const RULES: &[(&str, Rule)] = &[
    ("vector", vector_rule as Rule),
    ("reference", reference_rule as Rule),
    ("embedded", embedded_rule as Rule),
    ("empty", empty_rule as Rule),
];

const REFERENCE_SCHEMES: &[&str] = &["http", "https", "file", "blob"];
const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp",
];

fn vector_rule(s: &str) -> Option<RenderKind> {
    let opens = s
        .get(..4)
        .map_or(false, |head| head.eq_ignore_ascii_case("<svg"));
    if !opens || !s.contains("</svg>") {
        return None;
    }
    Some(match svg::sanitize(s) {
        Ok(markup) => RenderKind::Vector { markup },
        Err(e) => unknown(e),
    })
}

fn is_absolute_url(s: &str) -> bool {
    Url::parse(s).map_or(false, |u| REFERENCE_SCHEMES.contains(&u.scheme()))
}

fn reference_rule(s: &str) -> Option<RenderKind> {
    let lower = s.to_ascii_lowercase();
    let matched = lower.starts_with("data:")
        || is_absolute_url(s)
        || IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext));
    matched.then(|| RenderKind::Reference {
        location: s.to_string(),
    })
}

fn embedded_rule(s: &str) -> Option<RenderKind> {
    let (declared, payload) = embedded::split_payload(s)?;
    Some(RenderKind::EmbeddedImage {
        data_uri: embedded::to_data_uri(declared, payload),
    })
}

fn empty_rule(s: &str) -> Option<RenderKind> {
    s.is_empty().then_some(RenderKind::Default {
        glyph: DefaultGlyph::default(),
    })
}

fn unknown(err: QuickMenuError) -> RenderKind {
    tracing::warn!(error = %err, "icon content degraded to fallback");
    RenderKind::Unknown {
        diagnostic: err.to_string(),
    }
}

/// Stateless classifier for icon descriptors. Never fails: anything it cannot
/// make sense of comes back as [`RenderKind::Unknown`].
pub struct IconResolver;

impl IconResolver {
    /// Classify a raw icon descriptor.
    pub fn classify(raw: Option<&str>) -> RenderKind {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        for (name, rule) in RULES {
            if let Some(kind) = rule(trimmed) {
                tracing::debug!(rule = *name, kind = ?kind.icon_kind(), "icon classified");
                return kind;
            }
        }
        let preview: String = trimmed.chars().take(30).collect();
        unknown(QuickMenuError::Configuration(format!(
            "unrecognised icon format: {preview:?}"
        )))
    }

    /// Classify `raw` with the default icon style.
    pub fn resolve(raw: Option<&str>) -> RenderDescriptor {
        RenderDescriptor {
            kind: Self::classify(raw),
            style: IconStyle::default(),
        }
    }

    /// The kind to store alongside freshly entered `content`.
    pub fn detect_kind(content: &str) -> IconKind {
        Self::classify(Some(content)).icon_kind()
    }

    /// Resolve an icon configuration. `Default` yields the configured glyph
    /// and `Unknown` the fallback; neither looks at `content`. The other
    /// kinds are classified from their content.
    pub fn resolve_config(icon: &IconConfig, match_host_colors: bool) -> RenderDescriptor {
        let style = IconStyle::from_config(icon, match_host_colors);
        let kind = match icon.kind {
            IconKind::Default => RenderKind::Default { glyph: icon.glyph },
            IconKind::Unknown => RenderKind::Unknown {
                diagnostic: "icon kind is unknown".into(),
            },
            declared => match Self::classify(icon.content.as_deref()) {
                RenderKind::Default { .. } => RenderKind::Default { glyph: icon.glyph },
                kind => {
                    if kind.icon_kind() != declared {
                        tracing::debug!(
                            ?declared,
                            resolved = ?kind.icon_kind(),
                            "declared icon kind differs from content"
                        );
                    }
                    kind
                }
            },
        };
        RenderDescriptor { kind, style }
    }

    pub fn resolve_settings(settings: &Settings) -> RenderDescriptor {
        Self::resolve_config(&settings.icon, settings.match_host_colors)
    }
}
