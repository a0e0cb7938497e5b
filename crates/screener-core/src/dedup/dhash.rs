//! Difference hash (dHash) over a 9x8 grayscale thumbnail.

use image::imageops::FilterType;

use super::{FingerprintError, Fingerprinter};

const HASH_WIDTH: u32 = 9;
const HASH_HEIGHT: u32 = 8;

/// Default perceptual fingerprinter.
///
/// Each of the 64 bits says whether a pixel is brighter than its right
/// neighbour, so the hash survives re-encoding and small rendering noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DHash;

impl Fingerprinter for DHash {
    fn fingerprint(&self, image: &[u8]) -> Result<u64, FingerprintError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| FingerprintError(format!("decode: {e}")))?;
        let thumb = decoded
            .resize_exact(HASH_WIDTH, HASH_HEIGHT, FilterType::Triangle)
            .to_luma8();

        let mut hash = 0u64;
        for y in 0..HASH_HEIGHT {
            for x in 0..HASH_WIDTH - 1 {
                let left = thumb.get_pixel(x, y).0[0];
                let right = thumb.get_pixel(x + 1, y).0[0];
                hash = (hash << 1) | u64::from(left > right);
            }
        }
        Ok(hash)
    }
}
