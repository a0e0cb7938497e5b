//! Turns a raw capture into a kept, annotated, persisted result.

use std::sync::Arc;

use crate::annotate::Annotator;
use crate::capture::{CaptureResult, Outcome};
use crate::dedup::DuplicateDetector;
use crate::error::CaptureError;
use crate::output::{derive_file_stem, ResultWriter};

/// Dedup → annotate → save. Each stage is optional.
#[derive(Default)]
pub struct Assembler {
    detector: Option<DuplicateDetector>,
    annotator: Option<Arc<dyn Annotator>>,
    writer: Option<Arc<dyn ResultWriter>>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(mut self, detector: Option<DuplicateDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn Annotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn ResultWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Only `Captured` results are touched; everything else passes through.
    pub fn process(&self, mut result: CaptureResult) -> CaptureResult {
        if result.outcome != Outcome::Captured {
            return result;
        }
        let landing = result.landing_url.clone().unwrap_or_default();

        // Dedup runs on the raw capture so the footer cannot make two pages differ.
        let recorded = match self.detector.as_ref().map(|d| d.check(&landing, &result.image)) {
            Some(Err(kind)) => {
                tracing::info!(input = %result.target, %landing, %kind, "duplicate suppressed");
                result.outcome = Outcome::Duplicate(kind);
                return result;
            }
            Some(Ok(recorded)) => Some(recorded),
            None => None,
        };
        // Fingerprints only stand for captures that reached disk.
        let release = || {
            if let (Some(detector), Some(recorded)) = (&self.detector, &recorded) {
                detector.forget(recorded);
            }
        };

        if let (Some(annotator), Some(label)) = (&self.annotator, result.origin()) {
            match annotator.annotate(&result.image, &label) {
                Ok(annotated) => result.image = annotated,
                Err(e) => tracing::warn!(input = %result.target, error = %e, "annotation failed; keeping plain capture"),
            }
        }

        let Some(writer) = &self.writer else {
            return result;
        };
        let target_url = result.target_url.clone().unwrap_or_default();
        let saved = derive_file_stem(&target_url, &landing).and_then(|stem| writer.save(&result.image, &stem));
        match saved {
            Ok(Some(path)) => {
                tracing::info!(input = %result.target, path = %path.display(), "saved");
                result.outcome = Outcome::Saved(path);
            }
            Ok(None) => release(),
            Err(e) => {
                release();
                let detail = match e {
                    CaptureError::Write { detail, .. } => detail,
                    other => other.to_string(),
                };
                tracing::warn!(input = %result.target, %detail, "could not save capture");
                result.image = Vec::new();
                result.outcome = Outcome::Failed(CaptureError::Write {
                    url: target_url,
                    detail,
                });
            }
        }
        result
    }
}
