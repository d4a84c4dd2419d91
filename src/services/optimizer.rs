//! Size measurement and the truncation "compression" applied to uploads.
//!
//! Nothing here understands image formats. A result at any quality below 100
//! is a byte prefix of the upload and will not, in general, decode.

use bytes::Bytes;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Quality ladder offered for oversized uploads, in display order.
pub const QUALITY_LEVELS: [u8; 3] = [75, 50, 25];

pub const DEFAULT_QUALITY: u8 = QUALITY_LEVELS[0];

#[derive(Debug, Clone)]
pub struct QualityResult {
    pub quality: u8,
    pub data: Bytes,
}

impl QualityResult {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn size_mb(&self) -> f64 {
        measure_size(&self.data)
    }

    pub fn file_name(&self, original_name: &str) -> String {
        format!("optimized_{}_{}", self.quality, original_name)
    }
}

/// Size of `buffer` in MiB.
pub fn measure_size(buffer: &[u8]) -> f64 {
    buffer.len() as f64 / BYTES_PER_MB
}

/// Number of bytes kept at `quality` percent: `floor(len * quality / 100)`.
pub fn truncated_len(len: usize, quality: u8) -> usize {
    let quality = u128::from(quality.min(100));
    (len as u128 * quality / 100) as usize
}

/// First `floor(len * quality / 100)` bytes of `buffer`.
pub fn truncate(buffer: &[u8], quality: u8) -> &[u8] {
    &buffer[..truncated_len(buffer.len(), quality)]
}

pub fn needs_optimization(size_mb: f64, threshold_mb: f64) -> bool {
    size_mb > threshold_mb
}

/// One result per entry of [`QUALITY_LEVELS`]. Every result is a view into
/// `original`, so they are nested prefixes of it and of each other.
pub fn optimize(original: &Bytes) -> Vec<QualityResult> {
    QUALITY_LEVELS
        .iter()
        .map(|&quality| {
            let data = original.slice(..truncated_len(original.len(), quality));
            tracing::debug!(
                quality = quality,
                size_bytes = data.len(),
                "Simulated compression"
            );
            QualityResult { quality, data }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn buffer(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
    }

    #[test]
    fn truncated_length_is_floored() {
        let data = buffer(1001);
        for q in [0u8, 25, 50, 75, 100] {
            assert_eq!(truncate(&data, q).len(), 1001 * q as usize / 100);
        }
        assert_eq!(truncate(&data, 75).len(), 750);
        assert_eq!(truncate(&buffer(3), 50).len(), 1);
    }

    #[test]
    fn full_quality_is_identity() {
        let data = buffer(4097);
        assert_eq!(truncate(&data, 100), &data[..]);
    }

    #[test]
    fn lower_quality_is_prefix_of_higher() {
        let data = buffer(12345);
        let levels = [0u8, 25, 50, 75, 100];
        for (i, &low) in levels.iter().enumerate() {
            for &high in &levels[i + 1..] {
                let a = truncate(&data, low);
                let b = truncate(&data, high);
                assert!(b.starts_with(a), "q{} should prefix q{}", low, high);
            }
        }
    }

    #[test]
    fn quality_above_hundred_is_clamped() {
        let data = buffer(10);
        assert_eq!(truncate(&data, 250).len(), 10);
    }

    #[test]
    fn measures_in_mebibytes() {
        assert_eq!(measure_size(&[]), 0.0);
        assert_eq!(measure_size(&buffer(MIB)), 1.0);
        assert_eq!(measure_size(&buffer(MIB / 2)), 0.5);
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!needs_optimization(2.0, 2.0));
        assert!(needs_optimization(2.000001, 2.0));
        assert!(!needs_optimization(0.0, 2.0));
    }

    #[test]
    fn three_mib_upload_yields_ladder() {
        let data = buffer(3 * MIB);
        let results = optimize(&data);

        let lengths: Vec<usize> = results.iter().map(|r| r.size_bytes()).collect();
        assert_eq!(lengths, vec![2_359_296, 1_572_864, 786_432]);

        let sizes: Vec<f64> = results.iter().map(|r| r.size_mb()).collect();
        assert_eq!(sizes, vec![2.25, 1.5, 0.75]);

        assert_eq!(results[2].file_name("cat.jpg"), "optimized_25_cat.jpg");
        assert!(results[0].data.starts_with(&results[1].data));
        assert!(results[1].data.starts_with(&results[2].data));
        assert!(data.starts_with(&results[0].data));
    }
}
