//! Target normalization.
//!
//! Turns what the user typed (a domain, an IP, or a URL with or without scheme
//! and port) into a canonical [`NormalizedUrl`]. No network I/O happens here,
//! and a missing scheme stays missing: the capture orchestrator decides which
//! scheme to try.

mod authority;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::CaptureError;

/// Used only to get a scheme-less target through the URL parser.
const PLACEHOLDER_SCHEME: &str = "http";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn alternate(self) -> Scheme {
        match self {
            Scheme::Http => Scheme::Https,
            Scheme::Https => Scheme::Http,
        }
    }

    /// Scheme of an absolute URL string, if it is http or https.
    pub fn of_url(url: &str) -> Option<Scheme> {
        authority::explicit_scheme(url)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of a target.
///
/// Invariants: the host is lower-case and carries a port only when it is not
/// 80 or 443; the path starts with `/` and ends with `/` unless its last
/// segment names a file. Parsing the `Display` form yields an equal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl {
    scheme: Option<Scheme>,
    host: String,
    path: String,
    query: Option<String>,
}

impl NormalizedUrl {
    /// Scheme given by the user or forced by a well-known port.
    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    /// Host including a non-default port (`example.com:8080`).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host without port.
    pub fn host_name(&self) -> &str {
        host_without_port(&self.host)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Absolute URL for a capture attempt under `scheme`.
    pub fn with_scheme(&self, scheme: Scheme) -> String {
        format!("{}://{}", scheme, self.without_scheme())
    }

    /// `host/path?query`, the form used when no scheme is known.
    pub fn without_scheme(&self) -> String {
        match &self.query {
            Some(q) => format!("{}{}?{}", self.host, self.path, q),
            None => format!("{}{}", self.host, self.path),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Some(scheme) => write!(f, "{}://{}", scheme, self.without_scheme()),
            None => f.write_str(&self.without_scheme()),
        }
    }
}

impl FromStr for NormalizedUrl {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Normalizes a raw target.
///
/// # Examples
///
/// - `"example.com"` → `example.com/`
/// - `"example.com:443/login"` → `https://example.com/login/`
/// - `"http://Example.com/robots.txt"` → `http://example.com/robots.txt`
pub fn normalize(raw: &str) -> Result<NormalizedUrl, CaptureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::malformed(raw, "empty target"));
    }
    if let Some(other) = authority::foreign_scheme(trimmed) {
        return Err(CaptureError::malformed(
            raw,
            format!("unsupported scheme {other:?}"),
        ));
    }

    let mut scheme = authority::explicit_scheme(trimmed);
    let parse_input = match scheme {
        Some(_) => trimmed.to_string(),
        None => format!("{PLACEHOLDER_SCHEME}://{trimmed}"),
    };
    let parsed =
        url::Url::parse(&parse_input).map_err(|e| CaptureError::malformed(raw, e.to_string()))?;

    let host_name = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CaptureError::malformed(raw, "missing host"))?;

    let host = match authority::explicit_port(trimmed) {
        Some(443) => {
            scheme = Some(Scheme::Https);
            host_name.to_string()
        }
        Some(80) => {
            scheme = Some(Scheme::Http);
            host_name.to_string()
        }
        Some(port) => format!("{host_name}:{port}"),
        None => host_name.to_string(),
    };

    Ok(NormalizedUrl {
        scheme,
        host,
        path: ensure_trailing_slash(parsed.path()),
        query: parsed.query().map(str::to_string),
    })
}

/// Appends `/` unless the last segment looks like a file name.
fn ensure_trailing_slash(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') {
        return path.to_string();
    }
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    if last_segment.contains('.') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

pub(crate) fn host_without_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |close| &host[..=close]);
    }
    host.split(':').next().unwrap_or(host)
}
