//! Per-target result records.

use serde::Serialize;
use std::path::PathBuf;

use crate::dedup::DuplicateKind;
use crate::error::CaptureError;

/// Why a target produced no capture without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "status", rename_all = "snake_case")]
pub enum SkipReason {
    /// Its URL was already dispatched earlier in the run.
    AlreadyVisited,
    /// It matched an exclusion rule.
    Excluded,
    /// The page redirected while redirects are not followed.
    RedirectIgnored,
    /// The page answered with an ignored status code.
    StatusIgnored(u16),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyVisited => f.write_str("already visited"),
            SkipReason::Excluded => f.write_str("excluded"),
            SkipReason::RedirectIgnored => f.write_str("redirect ignored"),
            SkipReason::StatusIgnored(code) => write!(f, "status {code} ignored"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Screenshot taken, not yet deduplicated or written.
    Captured,
    Saved(PathBuf),
    Duplicate(DuplicateKind),
    Skipped(SkipReason),
    Failed(CaptureError),
}

/// Everything known about one target once it is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureResult {
    /// Raw target as given.
    pub target: String,
    /// Absolute URL of the attempt this result describes.
    pub target_url: Option<String>,
    pub landing_url: Option<String>,
    #[serde(skip)]
    pub image: Vec<u8>,
    pub status_code: Option<u16>,
    pub outcome: Outcome,
}

impl CaptureResult {
    pub(crate) fn captured(
        target: &str,
        target_url: String,
        landing_url: String,
        status_code: u16,
        image: Vec<u8>,
    ) -> Self {
        Self {
            target: target.to_string(),
            target_url: Some(target_url),
            landing_url: Some(landing_url),
            image,
            status_code: (status_code != 0).then_some(status_code),
            outcome: Outcome::Captured,
        }
    }

    pub fn failed(target: &str, target_url: Option<String>, err: CaptureError) -> Self {
        Self {
            target: target.to_string(),
            target_url,
            landing_url: None,
            image: Vec::new(),
            status_code: None,
            outcome: Outcome::Failed(err),
        }
    }

    pub(crate) fn skipped(target: &str, reason: SkipReason) -> Self {
        Self {
            target: target.to_string(),
            target_url: None,
            landing_url: None,
            image: Vec::new(),
            status_code: None,
            outcome: Outcome::Skipped(reason),
        }
    }

    /// Turns a capture into a skip, keeping its URLs and status but not its image.
    pub(crate) fn into_skipped(mut self, reason: SkipReason) -> Self {
        self.image = Vec::new();
        self.outcome = Outcome::Skipped(reason);
        self
    }

    /// True for results that carry nothing but the target (already-visited skips).
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none() && self.landing_url.is_none() && self.image.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// `scheme://host` of the landing URL, used as the annotation label.
    pub fn origin(&self) -> Option<String> {
        let landing = url::Url::parse(self.landing_url.as_deref()?).ok()?;
        let origin = landing.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_results_never_carry_an_image() {
        let r = CaptureResult::failed(
            "example.com",
            Some("https://example.com/".into()),
            CaptureError::DnsResolution {
                url: "https://example.com/".into(),
            },
        );
        assert!(r.image.is_empty());
        assert!(r.is_failed());
        assert!(!r.is_empty());
    }

    #[test]
    fn already_visited_is_empty() {
        let r = CaptureResult::skipped("example.com/", SkipReason::AlreadyVisited);
        assert!(r.is_empty());
        assert_eq!(r.outcome, Outcome::Skipped(SkipReason::AlreadyVisited));
    }

    #[test]
    fn origin_keeps_non_default_port() {
        let r = CaptureResult::captured(
            "x",
            "http://example.com:8080/a/".into(),
            "http://example.com:8080/a/b".into(),
            200,
            vec![1],
        );
        assert_eq!(r.origin().as_deref(), Some("http://example.com:8080"));
        assert_eq!(r.status_code, Some(200));
    }

    #[test]
    fn serializes_outcome_with_tag() {
        let r = CaptureResult::skipped("t", SkipReason::StatusIgnored(404));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["outcome"]["outcome"], "skipped");
        assert_eq!(json["outcome"]["detail"]["reason"], "status_ignored");
        assert_eq!(json["outcome"]["detail"]["status"], 404);
        assert!(json.get("image").is_none());
    }
}
