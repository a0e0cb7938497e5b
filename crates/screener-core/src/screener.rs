//! One full pipeline per target: orchestrate, then assemble.

use std::sync::Arc;
use std::time::Duration;

use crate::annotate::{Annotator, FooterAnnotator};
use crate::assemble::Assembler;
use crate::browser::BrowserController;
use crate::capture::{CaptureResult, Orchestrator, Outcome};
use crate::config::{ConfigError, ScreenerConfig};
use crate::dedup::DuplicateDetector;
use crate::error::CaptureError;
use crate::output::{DirectoryWriter, ResultWriter};
use crate::scope::Scope;

/// Run-scoped state shared by every worker through `Arc`.
pub struct Screener {
    orchestrator: Arc<Orchestrator>,
    assembler: Arc<Assembler>,
}

impl Screener {
    pub fn new(orchestrator: Orchestrator, assembler: Assembler) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            assembler: Arc::new(assembler),
        }
    }

    pub fn builder(config: &ScreenerConfig, controller: Arc<dyn BrowserController>) -> ScreenerBuilder {
        ScreenerBuilder::new(config.clone(), controller)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn scope(&self) -> &Scope {
        self.orchestrator.scope()
    }

    /// Capture, dedup, annotate and save one target.
    pub async fn process(&self, target: &str) -> CaptureResult {
        let captured = self.orchestrator.capture(target).await;
        if captured.outcome != Outcome::Captured {
            return captured;
        }

        // Decoding, hashing and disk writes stay off the async workers.
        let assembler = Arc::clone(&self.assembler);
        let fallback_url = captured.target_url.clone();
        let raw = captured.target.clone();
        match tokio::task::spawn_blocking(move || assembler.process(captured)).await {
            Ok(result) => result,
            Err(e) => {
                let url = fallback_url.clone().unwrap_or_else(|| raw.clone());
                let err = CaptureError::Write {
                    url,
                    detail: format!("assembly task failed: {e}"),
                };
                CaptureResult::failed(&raw, fallback_url, err)
            }
        }
    }
}

/// Builds a [`Screener`] from config, with overridable collaborators.
pub struct ScreenerBuilder {
    config: ScreenerConfig,
    controller: Arc<dyn BrowserController>,
    scope: Arc<Scope>,
    annotator: Option<Arc<dyn Annotator>>,
    writer: Option<Arc<dyn ResultWriter>>,
    grace: Option<Duration>,
}

impl ScreenerBuilder {
    fn new(config: ScreenerConfig, controller: Arc<dyn BrowserController>) -> Self {
        let annotator: Option<Arc<dyn Annotator>> = config
            .output
            .annotate
            .then(|| Arc::new(FooterAnnotator::default()) as Arc<dyn Annotator>);
        let writer: Arc<dyn ResultWriter> = Arc::new(DirectoryWriter::new(config.output.directory.clone()));
        Self {
            config,
            controller,
            scope: Arc::new(Scope::default()),
            annotator,
            writer: Some(writer),
            grace: None,
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Arc::new(scope);
        self
    }

    pub fn annotator(mut self, annotator: Option<Arc<dyn Annotator>>) -> Self {
        self.annotator = annotator;
        self
    }

    /// `None` keeps captures in memory only.
    pub fn writer(mut self, writer: Option<Arc<dyn ResultWriter>>) -> Self {
        self.writer = writer;
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = Some(grace);
        self
    }

    pub fn build(self) -> Result<Screener, ConfigError> {
        self.config.validate()?;
        let mut orchestrator = Orchestrator::new(self.controller, &self.config.capture, self.scope);
        if let Some(grace) = self.grace {
            orchestrator = orchestrator.with_grace(grace);
        }

        let mut assembler = Assembler::new().with_detector(DuplicateDetector::from_config(&self.config.dedup)?);
        if let Some(annotator) = self.annotator {
            assembler = assembler.with_annotator(annotator);
        }
        if let Some(writer) = self.writer {
            assembler = assembler.with_writer(writer);
        }
        Ok(Screener::new(orchestrator, assembler))
    }
}
