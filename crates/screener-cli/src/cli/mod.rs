//! CLI for screener.

mod input;
mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use screener_core::browser::ChromeController;
use screener_core::config::{self, PartitionBy, SchemeOrder, ScreenerConfig};
use screener_core::logging::Verbosity;
use screener_core::scheduler::{self, Dispatch};
use screener_core::scope::Scope;
use screener_core::Screener;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use report::Summary;

/// Screenshot a batch of hosts/URLs, skipping pages already seen.
///
/// Flags override values from the config file
/// (`~/.config/screener/config.toml` unless `--config` is given).
#[derive(Debug, Parser)]
#[command(name = "screener", version)]
#[command(about = "Batch web screenshots with duplicate suppression", long_about = None)]
pub struct Cli {
    /// Target to capture (domain, IP or URL). Repeat or separate with commas.
    #[arg(short = 't', long = "target", value_delimiter = ',', value_name = "TARGET")]
    pub targets: Vec<String>,

    /// File with one target per line.
    #[arg(short = 'l', long = "list", value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Captures in flight at once.
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Viewport width in pixels.
    #[arg(long, alias = "cw")]
    pub capture_width: Option<u32>,

    /// Viewport height in pixels.
    #[arg(long, alias = "ch")]
    pub capture_height: Option<u32>,

    /// Capture the full scrollable page.
    #[arg(long, alias = "cf")]
    pub capture_full: bool,

    /// Per-capture timeout in seconds.
    #[arg(long, alias = "to", value_name = "SECS")]
    pub timeout: Option<u64>,

    #[arg(long, alias = "ua")]
    pub user_agent: Option<String>,

    /// Skip pages that redirect instead of capturing where they land.
    #[arg(long, alias = "ir")]
    pub ignore_redirects: bool,

    /// Fail on TLS certificate errors instead of ignoring them.
    #[arg(long, alias = "rce")]
    pub respect_cert_err: bool,

    #[arg(long, alias = "uh")]
    pub use_http2: bool,

    /// Seconds to wait before each capture.
    #[arg(long, alias = "dc", value_name = "SECS")]
    pub delay_capture: Option<u64>,

    /// Seconds to wait between starting targets.
    #[arg(long, alias = "dbc", value_name = "SECS")]
    pub delay_between_capture: Option<u64>,

    /// Status codes whose pages are not kept (e.g. 404,500).
    #[arg(long, alias = "isc", value_delimiter = ',', value_name = "CODES")]
    pub ignore_status_codes: Vec<u16>,

    /// Drop exact and near-duplicate captures.
    #[arg(long, alias = "ad")]
    pub avoid_duplicates: bool,

    /// Similarity (1-100) at which two captures count as duplicates.
    #[arg(long, alias = "dt", value_name = "SCORE")]
    pub duplicate_threshold: Option<u32>,

    /// Grouping for near-duplicate comparisons.
    #[arg(long, value_enum)]
    pub partition_by: Option<PartitionArg>,

    /// Scheme tried first for targets given without one.
    #[arg(long, value_enum)]
    pub scheme_order: Option<SchemeOrderArg>,

    /// Exclusion rule: host, `*.suffix`, or URL. Repeat or separate with commas.
    #[arg(short = 'e', long = "exclude", value_delimiter = ',', value_name = "RULE")]
    pub exclude: Vec<String>,

    /// Output directory for captures.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub outfolder: Option<PathBuf>,

    /// Do not draw the URL under each capture.
    #[arg(long, alias = "nt")]
    pub no_text: bool,

    /// Print one JSON object per result instead of text.
    #[arg(long)]
    pub json: bool,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub debug: bool,

    /// Only log errors.
    #[arg(long)]
    pub silence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionArg {
    Site,
    Host,
    Global,
}

impl From<PartitionArg> for PartitionBy {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Site => PartitionBy::Site,
            PartitionArg::Host => PartitionBy::Host,
            PartitionArg::Global => PartitionBy::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeOrderArg {
    HttpsFirst,
    HttpFirst,
}

impl From<SchemeOrderArg> for SchemeOrder {
    fn from(arg: SchemeOrderArg) -> Self {
        match arg {
            SchemeOrderArg::HttpsFirst => SchemeOrder::HttpsFirst,
            SchemeOrderArg::HttpFirst => SchemeOrder::HttpFirst,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.debug, self.silence)
    }

    /// Overlays command-line flags on a loaded config.
    pub fn apply(&self, cfg: &mut ScreenerConfig) {
        if let Some(c) = self.concurrency {
            cfg.concurrency = c;
        }
        if let Some(secs) = self.delay_between_capture {
            cfg.delay_between_secs = secs;
        }

        let capture = &mut cfg.capture;
        if let Some(w) = self.capture_width {
            capture.width = w;
        }
        if let Some(h) = self.capture_height {
            capture.height = h;
        }
        if self.capture_full {
            capture.full_page = true;
        }
        if let Some(t) = self.timeout {
            capture.timeout_secs = t;
        }
        if let Some(ua) = &self.user_agent {
            capture.user_agent = ua.clone();
        }
        if self.ignore_redirects {
            capture.follow_redirects = false;
        }
        if self.respect_cert_err {
            capture.ignore_cert_errors = false;
        }
        if self.use_http2 {
            capture.use_http2 = true;
        }
        if let Some(secs) = self.delay_capture {
            capture.delay_before_secs = secs;
        }
        if !self.ignore_status_codes.is_empty() {
            capture.ignore_status_codes = self.ignore_status_codes.clone();
        }
        if let Some(order) = self.scheme_order {
            capture.scheme_order = order.into();
        }

        if self.avoid_duplicates {
            cfg.dedup.avoid_duplicates = true;
        }
        if let Some(t) = self.duplicate_threshold {
            cfg.dedup.threshold = t;
        }
        if let Some(p) = self.partition_by {
            cfg.dedup.partition_by = p.into();
        }

        if let Some(dir) = &self.outfolder {
            cfg.output.directory = dir.clone();
        }
        if self.no_text {
            cfg.output.annotate = false;
        }
    }

    fn load_config(&self) -> Result<ScreenerConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        self.apply(&mut cfg);
        cfg.validate().context("invalid configuration")?;
        tracing::debug!("effective config: {:?}", cfg);
        Ok(cfg)
    }

    pub async fn run(self) -> Result<()> {
        let cfg = self.load_config()?;

        let stdin = std::io::stdin();
        let piped = if self.targets.is_empty() && self.list.is_none() && !stdin.is_terminal() {
            Some(stdin.lock())
        } else {
            None
        };
        let targets = input::collect_targets(&self.targets, self.list.as_deref(), piped)?;
        if targets.is_empty() {
            bail!("no targets given: use -t, -l, or pipe targets on stdin");
        }

        let screener = Screener::builder(&cfg, Arc::new(ChromeController::new()))
            .scope(Scope::from_rules(&self.exclude))
            .build()
            .context("invalid configuration")?;

        tracing::info!(
            targets = targets.len(),
            concurrency = cfg.concurrency,
            out = %cfg.output.directory.display(),
            "starting capture run"
        );
        let mut rx = scheduler::run_streaming(Arc::new(screener), targets, Dispatch::from(&cfg));
        let mut summary = Summary::default();
        while let Some(result) = rx.recv().await {
            summary.record(&result);
            let line = if self.json {
                report::json_line(&result)?
            } else {
                report::text_line(&result)
            };
            println!("{line}");
        }

        tracing::info!(%summary, "capture run finished");
        if !self.silence && !self.json {
            eprintln!("{summary}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
