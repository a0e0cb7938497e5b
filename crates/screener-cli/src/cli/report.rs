//! Per-target output lines and the end-of-run summary.

use anyhow::Result;
use screener_core::capture::{CaptureResult, Outcome};
use std::fmt;

pub fn text_line(result: &CaptureResult) -> String {
    let landing = result.landing_url.as_deref().unwrap_or("-");
    match &result.outcome {
        Outcome::Saved(path) => {
            let status = result
                .status_code
                .map(|s| format!(" [{s}]"))
                .unwrap_or_default();
            format!("saved      {} -> {}{}", result.target, path.display(), status)
        }
        Outcome::Captured => format!("captured   {} {}", result.target, landing),
        Outcome::Duplicate(kind) => format!("duplicate  {} ({kind}) {}", result.target, landing),
        Outcome::Skipped(reason) => format!("skipped    {} ({reason})", result.target),
        Outcome::Failed(err) => format!("failed     {} ({}): {err}", result.target, err.kind()),
    }
}

pub fn json_line(result: &CaptureResult) -> Result<String> {
    Ok(serde_json::to_string(result)?)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub saved: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, result: &CaptureResult) {
        match result.outcome {
            Outcome::Saved(_) | Outcome::Captured => self.saved += 1,
            Outcome::Duplicate(_) => self.duplicates += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} saved, {} duplicate, {} skipped, {} failed",
            self.saved, self.duplicates, self.skipped, self.failed
        )
    }
}
