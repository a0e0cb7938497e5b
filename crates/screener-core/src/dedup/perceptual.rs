//! Near-duplicate index over perceptual fingerprints, partitioned by key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::ConfigError;

use super::Fingerprinter;

/// Bits in a fingerprint.
const FINGERPRINT_BITS: u32 = 64;

/// Similarity cut-off, inclusive range 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(u8);

impl Threshold {
    pub fn new(value: u32) -> Result<Self, ConfigError> {
        match u8::try_from(value) {
            Ok(v) if (1..=100).contains(&v) => Ok(Threshold(v)),
            _ => Err(ConfigError::InvalidThreshold(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Score in 0..=100; 100 means identical fingerprints.
pub fn similarity(a: u64, b: u64) -> u8 {
    let distance = (a ^ b).count_ones();
    let same = FINGERPRINT_BITS - distance;
    // round(100 * same / 64) in integer arithmetic
    ((200 * same + FINGERPRINT_BITS) / (2 * FINGERPRINT_BITS)) as u8
}

pub struct PerceptualIndex {
    fingerprinter: Arc<dyn Fingerprinter>,
    threshold: Threshold,
    partitions: Mutex<HashMap<String, Vec<u64>>>,
}

impl std::fmt::Debug for PerceptualIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptualIndex")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl PerceptualIndex {
    pub fn new(fingerprinter: Arc<dyn Fingerprinter>, threshold: Threshold) -> Self {
        Self {
            fingerprinter,
            threshold,
            partitions: Mutex::new(HashMap::new()),
        }
    }

    /// False when a stored fingerprint in `partition` scores at or above the
    /// threshold. Otherwise the fingerprint is stored and true is returned.
    /// An image that cannot be fingerprinted counts as unique.
    pub fn is_unique(&self, partition: &str, image: &[u8]) -> bool {
        self.offer(partition, image).is_ok()
    }

    /// Stores the image's fingerprint unless it is a near duplicate; `Err`
    /// carries the matching score. `Ok(None)` means nothing was stored
    /// because the image could not be fingerprinted.
    pub fn offer(&self, partition: &str, image: &[u8]) -> Result<Option<u64>, u8> {
        let fingerprint = match self.fingerprinter.fingerprint(image) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::warn!(partition, error = %e, "fingerprint failed; treating capture as unique");
                return Ok(None);
            }
        };

        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        let stored = partitions.entry(partition.to_string()).or_default();
        if let Some(score) = stored
            .iter()
            .map(|known| similarity(*known, fingerprint))
            .find(|score| *score >= self.threshold.get())
        {
            tracing::debug!(partition, score, threshold = self.threshold.get(), "near duplicate");
            return Err(score);
        }
        stored.push(fingerprint);
        Ok(Some(fingerprint))
    }

    /// Drops one stored copy of `fingerprint` from `partition`.
    pub fn remove(&self, partition: &str, fingerprint: u64) {
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stored) = partitions.get_mut(partition) {
            if let Some(pos) = stored.iter().position(|fp| *fp == fingerprint) {
                stored.swap_remove(pos);
            }
        }
    }
}
