//! Deterministic file names for captures.

use crate::error::CaptureError;

/// File extension of every capture.
pub const EXTENSION: &str = "png";

/// Stem (file name without extension) for a capture of `target_url` that
/// landed on `landing_url`.
///
/// The stem is `scheme_host_path` built from the target URL, with the scheme
/// taken from the landing URL, default ports dropped, `/` turned into `_`,
/// `:` into `-`, and everything lower-cased. Query strings are not part of
/// the name, so two queries on one path share a file.
pub fn derive_file_stem(target_url: &str, landing_url: &str) -> Result<String, CaptureError> {
    let target = url::Url::parse(target_url).map_err(|e| CaptureError::Write {
        url: target_url.to_string(),
        detail: format!("unparseable target URL: {e}"),
    })?;
    let landing = url::Url::parse(landing_url).map_err(|e| CaptureError::Write {
        url: target_url.to_string(),
        detail: format!("unparseable landing URL {landing_url:?}: {e}"),
    })?;

    let scheme = landing.scheme();
    let host = target.host_str().unwrap_or_default();
    // The parser already hides a port equal to the target scheme's default.
    let authority = match target.port() {
        Some(443) | None => host.to_string(),
        Some(80) if matches!(scheme, "http" | "https") => host.to_string(),
        Some(p) => format!("{host}:{p}"),
    };

    let raw = format!("{scheme}_{authority}{}", target.path());
    let trimmed = raw.strip_suffix('/').unwrap_or(&raw);
    Ok(trimmed.replace('/', "_").replace(':', "-").to_lowercase())
}

/// `<stem>.png`
pub fn file_name(stem: &str) -> String {
    format!("{stem}.{EXTENSION}")
}
