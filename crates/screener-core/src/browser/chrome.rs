//! Headless Chrome controller.
//!
//! One browser process per attempt. The `Browser` value owns the process and
//! kills it on drop, so every return path below cleans up.

use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use super::events::{fold_events, BrowserEvent};
use super::{BrowserController, BrowserError, BrowserErrorKind, CaptureOptions, PageCapture};

const RESPONSE_HANDLER: &str = "screener-status";
const PAGE_HEIGHT_JS: &str =
    "Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)";
/// Chrome refuses screenshots taller than this.
const MAX_FULL_PAGE_HEIGHT: f64 = 16_384.0;

/// One budget for a whole capture; each step gets what is left of it.
#[derive(Debug, Clone, Copy)]
struct Deadline(Instant);

impl Deadline {
    fn after(budget: Duration) -> Self {
        Deadline(Instant::now() + budget)
    }

    fn remaining(&self, step: &str) -> Result<Duration, BrowserError> {
        let left = self.0.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(BrowserError::new(
                BrowserErrorKind::Timeout,
                format!("capture deadline passed before {step}"),
            ));
        }
        Ok(left)
    }

    /// A failed step is a timeout if the budget ran out while it waited.
    fn failed(&self, step: &str, err: impl std::fmt::Display) -> BrowserError {
        let message = format!("{step}: {err:#}");
        if Instant::now() >= self.0 {
            BrowserError::new(BrowserErrorKind::Timeout, message)
        } else {
            BrowserError::unknown(message)
        }
    }
}

/// Drives a locally installed Chrome/Chromium through the DevTools protocol.
#[derive(Debug, Clone, Default)]
pub struct ChromeController {
    /// Run with a visible window (debugging).
    pub headful: bool,
}

impl ChromeController {
    pub fn new() -> Self {
        Self::default()
    }

    fn launch(&self, options: &CaptureOptions, deadline: Deadline) -> Result<Browser, BrowserError> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("--hide-scrollbars"), OsStr::new("--mute-audio")];
        if !options.use_http2 {
            args.push(OsStr::new("--disable-http2"));
        }
        let launch = LaunchOptions {
            headless: !self.headful,
            window_size: Some((options.width, options.height)),
            ignore_certificate_errors: options.ignore_cert_errors,
            idle_browser_timeout: deadline.remaining("launch")? + Duration::from_secs(30),
            args,
            ..Default::default()
        };
        Browser::new(launch).map_err(|e| {
            let err = deadline.failed("launch chrome", e);
            match err.kind {
                BrowserErrorKind::Timeout => err,
                _ => BrowserError::new(BrowserErrorKind::Navigation, err.message),
            }
        })
    }

    fn screenshot(tab: &Tab, options: &CaptureOptions, deadline: Deadline) -> Result<Vec<u8>, BrowserError> {
        tab.set_default_timeout(deadline.remaining("screenshot")?);
        let clip = if options.full_page {
            let height = tab
                .evaluate(PAGE_HEIGHT_JS, false)
                .ok()
                .and_then(|obj| obj.value)
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::from(options.height))
                .clamp(f64::from(options.height), MAX_FULL_PAGE_HEIGHT);
            Some(Viewport {
                x: 0.0,
                y: 0.0,
                width: f64::from(options.width),
                height,
                scale: 1.0,
            })
        } else {
            None
        };
        tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, clip, true)
            .map_err(|e| deadline.failed("screenshot", e))
    }
}

impl BrowserController for ChromeController {
    fn capture(&self, url: &str, options: &CaptureOptions) -> Result<PageCapture, BrowserError> {
        // Browser is dropped, and its process killed, on every return below.
        let deadline = Deadline::after(options.timeout);
        let browser = self.launch(options, deadline)?;
        let tab = browser.new_tab().map_err(|e| deadline.failed("open tab", e))?;
        tab.set_user_agent(&options.user_agent, None, None)
            .map_err(|e| BrowserError::unknown(format!("set user agent: {e:#}")))?;

        let (tx, rx) = mpsc::channel::<BrowserEvent>();
        let response_tx = tx.clone();
        tab.register_response_handling(
            RESPONSE_HANDLER,
            Box::new(move |params, _body| {
                let _ = response_tx.send(BrowserEvent::Response {
                    url: params.response.url.clone(),
                    status: u16::try_from(params.response.status).unwrap_or(0),
                });
            }),
        )
        .map_err(|e| BrowserError::unknown(format!("register response handler: {e:#}")))?;

        tracing::debug!(url, "navigating");
        tab.set_default_timeout(deadline.remaining("navigation")?);
        tab.navigate_to(url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| deadline.failed(&format!("navigate to {url}"), e))?;
        let _ = tx.send(BrowserEvent::Navigated { url: tab.get_url() });

        let image = Self::screenshot(&tab, options, deadline)?;
        let _ = tx.send(BrowserEvent::LoadFinished);

        let _ = tab.deregister_response_handling(RESPONSE_HANDLER);
        drop(tx);
        let summary = fold_events(rx.try_iter());
        Ok(PageCapture {
            landing_url: summary.landing_url.unwrap_or_else(|| url.to_string()),
            status_code: summary.status_code,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spent_deadline_is_a_timeout() {
        let deadline = Deadline::after(Duration::ZERO);
        let err = deadline.remaining("navigation").unwrap_err();
        assert_eq!(err.kind, BrowserErrorKind::Timeout);
        assert!(err.message.contains("navigation"));
        assert_eq!(deadline.failed("screenshot", "boom").kind, BrowserErrorKind::Timeout);
    }

    #[test]
    fn failure_inside_the_budget_is_left_to_the_classifier() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(deadline.remaining("launch").unwrap() > Duration::from_secs(59));
        let err = deadline.failed("navigate to https://a/", "net::ERR_CONNECTION_REFUSED");
        assert_eq!(err.kind, BrowserErrorKind::Unknown);
        assert_eq!(err.message, "navigate to https://a/: net::ERR_CONNECTION_REFUSED");
    }
}
