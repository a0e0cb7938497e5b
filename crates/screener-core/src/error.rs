//! Per-target error taxonomy.
//!
//! Every terminal failure of a target maps to exactly one variant so callers
//! can tell "failed to resolve" apart from "failed to render" or "could not be
//! written". Duplicate suppression is not an error; see `Outcome::Duplicate`.

use serde::Serialize;

/// Classified failure of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureError {
    /// The raw target could not be turned into a URL.
    #[error("malformed target {target:?}: {reason}")]
    MalformedTarget { target: String, reason: String },
    /// The host name did not resolve.
    #[error("DNS lookup failed for {url}")]
    DnsResolution { url: String },
    /// Navigation or rendering exceeded the per-target timeout.
    #[error("timed out capturing {url}: {detail}")]
    Timeout { url: String, detail: String },
    /// TLS certificate was rejected (only when certificate errors are respected).
    #[error("certificate error for {url}: {detail}")]
    Certificate { url: String, detail: String },
    /// Any other navigation, rendering, or screenshot failure.
    #[error("capture of {url} failed: {detail}")]
    Navigation { url: String, detail: String },
    /// The capture was taken but could not be persisted.
    #[error("could not write capture for {url}: {detail}")]
    Write { url: String, detail: String },
}

/// Coarse kind of a `CaptureError`, used by the scheme plan and for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedTarget,
    Dns,
    Timeout,
    Certificate,
    Navigation,
    Write,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedTarget => "malformed",
            ErrorKind::Dns => "dns",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Certificate => "certificate",
            ErrorKind::Navigation => "navigation",
            ErrorKind::Write => "write",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CaptureError {
    pub fn malformed(target: &str, reason: impl Into<String>) -> Self {
        CaptureError::MalformedTarget {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::MalformedTarget { .. } => ErrorKind::MalformedTarget,
            CaptureError::DnsResolution { .. } => ErrorKind::Dns,
            CaptureError::Timeout { .. } => ErrorKind::Timeout,
            CaptureError::Certificate { .. } => ErrorKind::Certificate,
            CaptureError::Navigation { .. } => ErrorKind::Navigation,
            CaptureError::Write { .. } => ErrorKind::Write,
        }
    }
}
