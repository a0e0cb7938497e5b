use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Chrome 129 on macOS; the same string a desktop visitor would send.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Configuration values rejected at startup instead of being clamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid similarity threshold {0}: must be between 1 and 100")]
    InvalidThreshold(u32),
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("capture width and height must both be non-zero")]
    ZeroViewport,
}

/// Which scheme to try first for targets given without one.
///
/// Historical releases disagreed (http first vs https first), so this is an
/// explicit setting. The default is `https-first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeOrder {
    #[default]
    HttpsFirst,
    HttpFirst,
}

/// How near-duplicate comparisons are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionBy {
    /// Last two DNS labels of the landing host (`a.example.com` → `example.com`).
    #[default]
    Site,
    /// Full landing host including port.
    Host,
    /// One partition for the whole run.
    Global,
}

/// Browser-facing capture settings (`[capture]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    /// Capture the whole scrollable page instead of the viewport.
    pub full_page: bool,
    /// Per-target timeout in seconds, enforced by the browser controller.
    pub timeout_secs: u64,
    pub user_agent: String,
    pub follow_redirects: bool,
    pub ignore_cert_errors: bool,
    pub use_http2: bool,
    /// Wait before dispatching each capture attempt (seconds).
    pub delay_before_secs: u64,
    /// Captures answering with one of these status codes are skipped.
    pub ignore_status_codes: Vec<u16>,
    pub scheme_order: SchemeOrder,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
            full_page: false,
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
            ignore_cert_errors: true,
            use_http2: false,
            delay_before_secs: 2,
            ignore_status_codes: Vec::new(),
            scheme_order: SchemeOrder::default(),
        }
    }
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay_before(&self) -> Duration {
        Duration::from_secs(self.delay_before_secs)
    }
}

/// Duplicate suppression settings (`[dedup]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub avoid_duplicates: bool,
    /// Similarity score (1-100) at or above which two captures are near-duplicates.
    pub threshold: u32,
    pub partition_by: PartitionBy,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            avoid_duplicates: false,
            threshold: 96,
            partition_by: PartitionBy::default(),
        }
    }
}

/// Where and how unique captures are written (`[output]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Draw the origin URL in a footer band below each capture.
    pub annotate: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./screenshots"),
            annotate: true,
        }
    }
}

/// Global configuration loaded from `~/.config/screener/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Maximum captures in flight at once.
    pub concurrency: usize,
    /// Wait between dispatching consecutive targets (seconds).
    pub delay_between_secs: u64,
    pub capture: CaptureConfig,
    pub dedup: DedupConfig,
    pub output: OutputConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            delay_between_secs: 0,
            capture: CaptureConfig::default(),
            dedup: DedupConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl ScreenerConfig {
    pub fn delay_between(&self) -> Duration {
        Duration::from_secs(self.delay_between_secs)
    }

    /// Fail fast on values that would otherwise be silently adjusted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if !(1..=100).contains(&self.dedup.threshold) {
            return Err(ConfigError::InvalidThreshold(self.dedup.threshold));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::ZeroViewport);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("screener")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScreenerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScreenerConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path. Missing keys take their defaults.
pub fn load_from(path: &Path) -> Result<ScreenerConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ScreenerConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
