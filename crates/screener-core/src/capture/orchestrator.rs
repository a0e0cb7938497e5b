use std::sync::Arc;
use std::time::Duration;

use crate::browser::{BrowserController, CaptureOptions, PageCapture};
use crate::config::{CaptureConfig, SchemeOrder};
use crate::error::CaptureError;
use crate::scope::Scope;
use crate::target::{self, NormalizedUrl, Scheme};

use super::classify::classify;
use super::plan::{decide_error, decide_success, scheme_plan, AttemptDecision, MAX_ATTEMPTS};
use super::result::{CaptureResult, SkipReason};
use super::visited::VisitedSet;

/// Extra time granted to the browser beyond its own timeout before the
/// attempt is abandoned.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Per-target state machine: normalize, filter, try schemes, classify.
pub struct Orchestrator {
    controller: Arc<dyn BrowserController>,
    options: CaptureOptions,
    scheme_order: SchemeOrder,
    delay_before: Duration,
    ignore_status_codes: Vec<u16>,
    grace: Duration,
    scope: Arc<Scope>,
    visited: VisitedSet,
}

/// One successful attempt waiting to be accepted.
struct Landed {
    url: String,
    page: PageCapture,
}

impl Orchestrator {
    pub fn new(controller: Arc<dyn BrowserController>, cfg: &CaptureConfig, scope: Arc<Scope>) -> Self {
        Self {
            controller,
            options: CaptureOptions::from(cfg),
            scheme_order: cfg.scheme_order,
            delay_before: cfg.delay_before(),
            ignore_status_codes: cfg.ignore_status_codes.clone(),
            grace: DEFAULT_GRACE,
            scope,
            visited: VisitedSet::new(),
        }
    }

    /// Overrides the backstop grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Runs one target to a terminal outcome. Never panics on bad input.
    pub async fn capture(&self, raw: &str) -> CaptureResult {
        self.scope.admit(raw);

        let normalized = match target::normalize(raw) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(input = raw, error = %e, "malformed target");
                return CaptureResult::failed(raw, None, e);
            }
        };
        if self.scope.is_excluded(&normalized) {
            tracing::debug!(input = raw, url = %normalized, "excluded by scope");
            return CaptureResult::skipped(raw, SkipReason::Excluded);
        }

        let plan = scheme_plan(&normalized, self.scheme_order);
        self.run_plan(raw, &normalized, &plan).await
    }

    async fn run_plan(&self, raw: &str, normalized: &NormalizedUrl, plan: &[Scheme]) -> CaptureResult {
        let mut fallback: Option<Landed> = None;
        let mut first_error: Option<(String, CaptureError)> = None;

        for (attempt, scheme) in plan.iter().copied().enumerate().take(MAX_ATTEMPTS) {
            let url = normalized.with_scheme(scheme);
            if !self.visited.claim(&url) {
                if attempt == 0 {
                    tracing::debug!(input = raw, %url, "already visited");
                    return CaptureResult::skipped(raw, SkipReason::AlreadyVisited);
                }
                tracing::debug!(input = raw, %url, "alternate already visited");
                break;
            }
            let alternate = plan.get(attempt + 1).copied();

            if !self.delay_before.is_zero() {
                tokio::time::sleep(self.delay_before).await;
            }

            tracing::debug!(input = raw, %url, attempt = attempt + 1, "dispatching capture");
            match self.dispatch(&url).await {
                Ok(page) => {
                    match decide_success(&page.landing_url, alternate, self.options.follow_redirects) {
                        AttemptDecision::TryAlternate => {
                            tracing::debug!(
                                input = raw,
                                %url,
                                landing = %page.landing_url,
                                "redirected to alternate scheme; retrying directly"
                            );
                            fallback = Some(Landed { url, page });
                        }
                        _ => return self.accept(raw, Landed { url, page }),
                    }
                }
                Err(err) => {
                    let decision = decide_error(err.kind(), alternate);
                    tracing::debug!(input = raw, %url, error = %err, ?decision, "attempt failed");
                    if let Some(landed) = fallback.take() {
                        return self.accept(raw, landed);
                    }
                    match decision {
                        AttemptDecision::TryAlternate => {
                            first_error.get_or_insert((url, err));
                        }
                        _ => {
                            let (url, err) = first_error.unwrap_or((url, err));
                            return CaptureResult::failed(raw, Some(url), err);
                        }
                    }
                }
            }
        }

        if let Some(landed) = fallback {
            return self.accept(raw, landed);
        }
        match first_error {
            Some((url, err)) => CaptureResult::failed(raw, Some(url), err),
            // Every URL in the plan was claimed by someone else.
            None => CaptureResult::skipped(raw, SkipReason::AlreadyVisited),
        }
    }

    /// Runs the blocking controller off the async threads, with a backstop
    /// timeout in case the controller ignores its own. A call that outlives
    /// the backstop is reported as `Timeout` only once it has returned, so
    /// the caller's concurrency slot covers the whole browser call.
    async fn dispatch(&self, url: &str) -> Result<PageCapture, CaptureError> {
        let controller = Arc::clone(&self.controller);
        let options = self.options.clone();
        let owned_url = url.to_string();
        let mut task = tokio::task::spawn_blocking(move || controller.capture(&owned_url, &options));

        let limit = self.options.timeout + self.grace;
        let joined = match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(%url, limit_ms = limit.as_millis() as u64, "browser overran its deadline; waiting for it to stop");
                let _ = task.await;
                return Err(CaptureError::Timeout {
                    url: url.to_string(),
                    detail: format!("no answer from browser within {}ms", limit.as_millis()),
                });
            }
        };
        match joined {
            Ok(Ok(page)) => Ok(page),
            Ok(Err(e)) => Err(classify(&e, url)),
            Err(join_err) => Err(CaptureError::Navigation {
                url: url.to_string(),
                detail: format!("browser task failed: {join_err}"),
            }),
        }
    }

    /// Applies the redirect and status filters to a successful attempt.
    fn accept(&self, raw: &str, landed: Landed) -> CaptureResult {
        let Landed { url, page } = landed;
        let redirected = !same_location(&url, &page.landing_url);
        let result = CaptureResult::captured(raw, url, page.landing_url, page.status_code, page.image);

        if redirected && !self.options.follow_redirects {
            tracing::info!(input = raw, landing = ?result.landing_url, "redirect ignored");
            return result.into_skipped(SkipReason::RedirectIgnored);
        }
        if let Some(code) = result.status_code.filter(|c| self.ignore_status_codes.contains(c)) {
            tracing::info!(input = raw, status = code, "status code ignored");
            return result.into_skipped(SkipReason::StatusIgnored(code));
        }
        tracing::debug!(input = raw, landing = ?result.landing_url, status = ?result.status_code, "captured");
        result
    }
}

fn same_location(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_not_a_redirect() {
        assert!(same_location("https://example.com/a/", "https://example.com/a"));
        assert!(!same_location("http://example.com/", "https://example.com/"));
    }
}
