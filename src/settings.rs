use crate::icon::IconResolver;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the toggle icon was configured. Only `Vector`, `Reference` and
/// `EmbeddedImage` make `IconConfig::content` authoritative; `Default` and
/// `Unknown` never read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IconKind {
    Default,
    #[serde(alias = "svg")]
    Vector,
    #[serde(alias = "url")]
    Reference,
    EmbeddedImage,
    Unknown,
}

impl Default for IconKind {
    fn default() -> Self {
        IconKind::Default
    }
}

/// Built-in glyph shown when the icon kind is `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultGlyph {
    Rocket,
    Comment,
    Star,
    Bolt,
}

impl Default for DefaultGlyph {
    fn default() -> Self {
        DefaultGlyph::Rocket
    }
}

impl std::fmt::Display for DefaultGlyph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultGlyph::Rocket => write!(f, "fa-rocket"),
            DefaultGlyph::Comment => write!(f, "fa-comment"),
            DefaultGlyph::Star => write!(f, "fa-star"),
            DefaultGlyph::Bolt => write!(f, "fa-bolt"),
        }
    }
}

impl DefaultGlyph {
    fn from_legacy(name: &str) -> Option<Self> {
        match name {
            "rocket" => Some(DefaultGlyph::Rocket),
            "comment" => Some(DefaultGlyph::Comment),
            "star" => Some(DefaultGlyph::Star),
            "bolt" => Some(DefaultGlyph::Bolt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconConfig {
    #[serde(default)]
    pub kind: IconKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_hover_color")]
    pub hover_color: String,
    #[serde(default = "default_active_color")]
    pub active_color: String,
    /// CSS length applied to the toggle icon.
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub glyph: DefaultGlyph,
}

fn default_color() -> String {
    "#a0a0a0".into()
}

fn default_hover_color() -> String {
    "#ffffff".into()
}

fn default_active_color() -> String {
    "#55aaff".into()
}

fn default_size() -> String {
    "1.2em".into()
}

fn default_enabled() -> bool {
    true
}

fn default_match_host_colors() -> bool {
    true
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            kind: IconKind::Default,
            content: None,
            color: default_color(),
            hover_color: default_hover_color(),
            active_color: default_active_color(),
            size: default_size(),
            glyph: DefaultGlyph::Rocket,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// When `false` the toggle ignores activation and an open menu closes.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub icon: IconConfig,
    /// Borrow the host send button's colors instead of the icon palette.
    #[serde(default = "default_match_host_colors")]
    pub match_host_colors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            icon: IconConfig::default(),
            match_host_colors: default_match_host_colors(),
        }
    }
}

/// Read `key` from `obj`, falling back to `default` when the key is missing
/// or holds a value of the wrong shape.
fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    default: impl FnOnce() -> T,
) -> T {
    match obj.get(key) {
        None => default(),
        Some(value) => match T::deserialize(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(field = key, error = %e, "persisted setting has the wrong type; using default");
                default()
            }
        },
    }
}

fn reconcile_icon(obj: &Map<String, Value>) -> IconConfig {
    IconConfig {
        kind: field(obj, "kind", IconKind::default),
        content: field(obj, "content", || None),
        color: field(obj, "color", default_color),
        hover_color: field(obj, "hoverColor", default_hover_color),
        active_color: field(obj, "activeColor", default_active_color),
        size: field(obj, "size", default_size),
        glyph: field(obj, "glyph", DefaultGlyph::default),
    }
}

/// Build an `icon` object out of the flat keys written by earlier releases
/// (`iconType`, `customIconUrl`).
fn migrate_legacy_icon(obj: &Map<String, Value>) -> Option<IconConfig> {
    let icon_type = obj.get("iconType").and_then(Value::as_str)?;
    let mut icon = IconConfig::default();
    if icon_type == "custom" {
        let content = obj
            .get("customIconUrl")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        if let Some(content) = content {
            icon.kind = IconResolver::detect_kind(&content);
            icon.content = Some(content);
        }
    } else if let Some(glyph) = DefaultGlyph::from_legacy(icon_type) {
        icon.glyph = glyph;
    } else {
        tracing::warn!(icon_type, "unrecognised legacy icon type; using default glyph");
    }
    tracing::info!(?icon.kind, "migrated legacy icon settings");
    Some(icon)
}

/// Reconcile a possibly partial or stale persisted object against the default
/// schema. Missing fields are filled with defaults, present fields are kept
/// as they are (including `false` and empty strings).
///
/// `reconcile(&serde_json::to_value(reconcile(x))?)` always equals
/// `reconcile(x)`.
pub fn reconcile(persisted: &Value) -> Settings {
    let Some(obj) = persisted.as_object() else {
        if !persisted.is_null() {
            tracing::warn!("persisted settings are not an object; using defaults");
        }
        return Settings::default();
    };

    let icon = match obj.get("icon") {
        Some(Value::Object(icon)) => reconcile_icon(icon),
        Some(_) => {
            tracing::warn!("persisted icon settings are not an object; using defaults");
            IconConfig::default()
        }
        None => migrate_legacy_icon(obj).unwrap_or_default(),
    };

    let match_host_colors = if obj.contains_key("matchHostColors") {
        field(obj, "matchHostColors", default_match_host_colors)
    } else {
        field(obj, "matchButtonColors", default_match_host_colors)
    };

    Settings {
        enabled: field(obj, "enabled", default_enabled),
        icon,
        match_host_colors,
    }
}

impl Settings {
    /// Load settings from the JSON file at `path`, reconciling them against
    /// the defaults. A missing or empty file yields the default settings.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(&content)?;
        Ok(reconcile(&value))
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
