//! Map browser failures onto the capture error taxonomy.

use crate::browser::{BrowserError, BrowserErrorKind};
use crate::error::CaptureError;

const DNS_MARKERS: &[&str] = &["net::err_name_not_resolved", "no such host", "name or service not known"];
const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out", "timed_out", "deadline", "event waited for never came"];
const CERT_MARKERS: &[&str] = &["err_cert_", "err_ssl_", "certificate"];

/// Kind for an error the controller could not classify itself.
pub fn classify_message(message: &str) -> BrowserErrorKind {
    let lower = message.to_ascii_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    if has(DNS_MARKERS) {
        BrowserErrorKind::Dns
    } else if has(TIMEOUT_MARKERS) {
        BrowserErrorKind::Timeout
    } else if has(CERT_MARKERS) {
        BrowserErrorKind::Certificate
    } else {
        BrowserErrorKind::Navigation
    }
}

/// Classify a browser error raised while capturing `url`.
pub fn classify(err: &BrowserError, url: &str) -> CaptureError {
    let kind = match err.kind {
        BrowserErrorKind::Unknown => classify_message(&err.message),
        known => known,
    };
    let url = url.to_string();
    let detail = err.message.clone();
    match kind {
        BrowserErrorKind::Dns => CaptureError::DnsResolution { url },
        BrowserErrorKind::Timeout => CaptureError::Timeout { url, detail },
        BrowserErrorKind::Certificate => CaptureError::Certificate { url, detail },
        BrowserErrorKind::Navigation | BrowserErrorKind::Unknown => {
            CaptureError::Navigation { url, detail }
        }
    }
}
