//! Browser controller seam.
//!
//! The engine never renders anything itself. It hands an absolute URL and a
//! set of options to a [`BrowserController`] and gets back the landing URL,
//! the main document's status code, and the encoded screenshot.

mod chrome;
mod events;

pub use chrome::ChromeController;
pub use events::{fold_events, BrowserEvent, PageSummary};

use std::time::Duration;

use crate::config::CaptureConfig;

/// Per-attempt browser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
    pub user_agent: String,
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub ignore_cert_errors: bool,
    pub full_page: bool,
    pub use_http2: bool,
}

impl From<&CaptureConfig> for CaptureOptions {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            user_agent: cfg.user_agent.clone(),
            timeout: cfg.timeout(),
            follow_redirects: cfg.follow_redirects,
            ignore_cert_errors: cfg.ignore_cert_errors,
            full_page: cfg.full_page,
            use_http2: cfg.use_http2,
        }
    }
}

/// What a successful navigation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCapture {
    /// URL actually rendered after redirects.
    pub landing_url: String,
    /// Status of the main document; 0 when the browser never reported one.
    pub status_code: u16,
    /// Encoded PNG.
    pub image: Vec<u8>,
}

/// Failure class reported by a controller. `Unknown` is classified later
/// from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserErrorKind {
    Timeout,
    Dns,
    Certificate,
    Navigation,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BrowserError {
    pub kind: BrowserErrorKind,
    pub message: String,
}

impl BrowserError {
    pub fn new(kind: BrowserErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(BrowserErrorKind::Unknown, message)
    }
}

/// Loads a URL and screenshots it. Blocking; the orchestrator runs it on a
/// blocking thread.
pub trait BrowserController: Send + Sync {
    fn capture(&self, url: &str, options: &CaptureOptions) -> Result<PageCapture, BrowserError>;
}
