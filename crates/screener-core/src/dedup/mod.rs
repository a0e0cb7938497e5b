//! Duplicate suppression: exact (SHA-256) and perceptual (dHash) indexes.
//!
//! Both are advisory. A capture that cannot be fingerprinted is kept.

mod dhash;
mod exact;
mod perceptual;

pub use dhash::DHash;
pub use exact::{sha256_hex, ExactIndex};
pub use perceptual::{similarity, PerceptualIndex, Threshold};

use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::{ConfigError, DedupConfig, PartitionBy};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not fingerprint capture: {0}")]
pub struct FingerprintError(pub String);

/// Produces a 64-bit perceptual fingerprint from encoded image bytes.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, image: &[u8]) -> Result<u64, FingerprintError>;
}

/// Why a capture was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    Exact,
    Near,
}

impl std::fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DuplicateKind::Exact => "exact",
            DuplicateKind::Near => "near",
        })
    }
}

/// Partition key for a landing URL.
pub fn partition_key(landing_url: &str, by: PartitionBy) -> String {
    if by == PartitionBy::Global {
        return String::new();
    }
    let host = match url::Url::parse(landing_url) {
        Ok(u) => match (u.host_str(), u.port()) {
            (Some(h), Some(p)) if by == PartitionBy::Host => format!("{h}:{p}"),
            (Some(h), _) => h.to_string(),
            (None, _) => landing_url.to_string(),
        },
        Err(_) => landing_url.to_string(),
    };
    match by {
        PartitionBy::Site => registrable_site(&host),
        _ => host,
    }
}

/// Last two DNS labels, or the whole host for IP literals.
fn registrable_site(host: &str) -> String {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }
    let labels: Vec<&str> = host.trim_end_matches('.').rsplitn(3, '.').collect();
    match labels.as_slice() {
        [tld, sld, ..] => format!("{sld}.{tld}"),
        _ => host.to_string(),
    }
}

/// Exact and perceptual indexes plus the settings that drive them.
#[derive(Debug)]
pub struct DuplicateDetector {
    exact: ExactIndex,
    perceptual: PerceptualIndex,
    partition_by: PartitionBy,
}

impl DuplicateDetector {
    pub fn new(
        threshold: Threshold,
        partition_by: PartitionBy,
        fingerprinter: Arc<dyn Fingerprinter>,
    ) -> Self {
        Self {
            exact: ExactIndex::new(),
            perceptual: PerceptualIndex::new(fingerprinter, threshold),
            partition_by,
        }
    }

    /// Detector for the config, or `None` when duplicate avoidance is off.
    pub fn from_config(cfg: &DedupConfig) -> Result<Option<Self>, ConfigError> {
        let threshold = Threshold::new(cfg.threshold)?;
        if !cfg.avoid_duplicates {
            return Ok(None);
        }
        Ok(Some(Self::new(threshold, cfg.partition_by, Arc::new(DHash))))
    }

    /// Exact check first, then perceptual within the landing URL's partition.
    /// A unique capture's fingerprints are recorded straight away so a
    /// concurrent copy is caught; release them with [`Self::forget`] if the
    /// capture is not kept.
    pub fn check(&self, landing_url: &str, image: &[u8]) -> Result<Recorded, DuplicateKind> {
        let digest = sha256_hex(image);
        if !self.exact.record(digest.clone()) {
            return Err(DuplicateKind::Exact);
        }
        let partition = partition_key(landing_url, self.partition_by);
        match self.perceptual.offer(&partition, image) {
            Ok(fingerprint) => Ok(Recorded {
                digest,
                partition,
                fingerprint,
            }),
            Err(_) => {
                self.exact.remove(&digest);
                Err(DuplicateKind::Near)
            }
        }
    }

    /// Undoes what [`Self::check`] recorded.
    pub fn forget(&self, recorded: &Recorded) {
        self.exact.remove(&recorded.digest);
        if let Some(fp) = recorded.fingerprint {
            self.perceptual.remove(&recorded.partition, fp);
        }
    }
}

/// Fingerprints stored for a capture that passed [`DuplicateDetector::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    digest: String,
    partition: String,
    fingerprint: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(u64);

    impl Fingerprinter for Constant {
        fn fingerprint(&self, _image: &[u8]) -> Result<u64, FingerprintError> {
            Ok(self.0)
        }
    }

    #[test]
    fn site_partition_groups_subdomains() {
        assert_eq!(partition_key("https://a.example.com/x", PartitionBy::Site), "example.com");
        assert_eq!(partition_key("http://b.example.com:8080/", PartitionBy::Site), "example.com");
        assert_eq!(partition_key("http://localhost/", PartitionBy::Site), "localhost");
        assert_eq!(partition_key("http://10.1.2.3:81/", PartitionBy::Site), "10.1.2.3");
        assert_eq!(partition_key("http://[::1]/", PartitionBy::Site), "[::1]");
    }

    #[test]
    fn host_and_global_partitions() {
        assert_eq!(partition_key("http://a.example.com:8080/", PartitionBy::Host), "a.example.com:8080");
        assert_eq!(partition_key("https://a.example.com/", PartitionBy::Host), "a.example.com");
        assert_eq!(partition_key("https://a.example.com/", PartitionBy::Global), "");
    }

    #[test]
    fn exact_wins_over_near() {
        let d = DuplicateDetector::new(Threshold::new(96).unwrap(), PartitionBy::Site, Arc::new(Constant(7)));
        assert!(d.check("https://a.example.com/", b"img").is_ok());
        assert_eq!(d.check("https://a.example.com/", b"img"), Err(DuplicateKind::Exact));
        assert_eq!(d.check("https://b.example.com/", b"other"), Err(DuplicateKind::Near));
        assert!(d.check("https://other.org/", b"third").is_ok());
    }

    #[test]
    fn near_rejection_leaves_no_exact_digest() {
        let d = DuplicateDetector::new(Threshold::new(96).unwrap(), PartitionBy::Site, Arc::new(Constant(7)));
        assert!(d.check("https://a.example.com/", b"one").is_ok());
        assert_eq!(d.check("https://b.example.com/", b"two"), Err(DuplicateKind::Near));
        // "two" was never kept, so elsewhere it is a fresh capture
        assert!(d.check("https://other.org/", b"two").is_ok());
    }

    #[test]
    fn forgotten_capture_does_not_suppress_later_copies() {
        let d = DuplicateDetector::new(Threshold::new(96).unwrap(), PartitionBy::Site, Arc::new(Constant(7)));
        let recorded = d.check("https://a.example.com/", b"img").unwrap();
        d.forget(&recorded);
        assert!(d.check("https://b.example.com/", b"img").is_ok());
        assert_eq!(d.check("https://c.example.com/", b"img"), Err(DuplicateKind::Exact));
    }

    #[test]
    fn disabled_config_yields_no_detector_but_still_validates() {
        let mut cfg = DedupConfig::default();
        assert!(DuplicateDetector::from_config(&cfg).unwrap().is_none());
        cfg.threshold = 0;
        assert!(DuplicateDetector::from_config(&cfg).is_err());
        cfg.threshold = 90;
        cfg.avoid_duplicates = true;
        assert!(DuplicateDetector::from_config(&cfg).unwrap().is_some());
    }
}
