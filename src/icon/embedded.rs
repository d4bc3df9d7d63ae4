//! Recognition of base64 image payloads pasted without a `data:` prefix.

use base64::{engine::general_purpose::STANDARD, Engine as _};

const BASE64_MARKER: &str = "base64,";

/// Mime type used when neither the payload nor its declared prefix tells us
/// what the image is.
pub const FALLBACK_MIME: &str = "image/png";

/// Leading characters of well known formats once base64 encoded.
const ENCODED_SIGNATURES: &[&str] = &["iVBORw0KGgo", "/9j/", "PHN2Zy", "PD94bWw"];

/// Leading bytes of the decoded payload.
const MAGIC: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF" as &[u8], "image/jpeg"),
    (b"\x89PNG" as &[u8], "image/png"),
    (b"<svg" as &[u8], "image/svg+xml"),
    (b"<?xml" as &[u8], "image/svg+xml"),
];

/// Enough characters to decode every signature in [`MAGIC`].
const SNIFF_CHARS: usize = 16;

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

/// Split `s` into an optional declared mime type and the encoded payload.
///
/// Returns `None` when `s` carries neither a `base64,` marker nor a leading
/// encoded image signature.
pub fn split_payload(s: &str) -> Option<(Option<&str>, &str)> {
    if let Some(idx) = s.find(BASE64_MARKER) {
        let payload = s[idx + BASE64_MARKER.len()..].trim();
        if payload.is_empty() {
            return None;
        }
        let prefix = s[..idx].trim().trim_end_matches(';').trim();
        let declared = prefix.starts_with("image/").then_some(prefix);
        return Some((declared, payload));
    }
    ENCODED_SIGNATURES
        .iter()
        .any(|sig| s.starts_with(sig))
        .then_some((None, s))
}

/// Infer a mime type from the first decoded bytes of `payload`.
pub fn sniff_mime(payload: &str) -> Option<&'static str> {
    let head: String = payload
        .chars()
        .take_while(|c| is_base64_char(*c))
        .take(SNIFF_CHARS)
        .collect();
    let usable = head.len() / 4 * 4;
    let bytes = STANDARD.decode(&head[..usable]).ok()?;
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let bytes = &bytes[start..];
    MAGIC
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}

/// Build a `data:` URI for a payload found by [`split_payload`].
pub fn to_data_uri(declared: Option<&str>, payload: &str) -> String {
    let mime = sniff_mime(payload)
        .or(declared)
        .unwrap_or(FALLBACK_MIME);
    format!("data:{mime};base64,{payload}")
}
