//! Decoder-free byte profile analyzer.
//!
//! Used by the binary when no media decoder is plugged in. It treats the
//! file as a stream of byte samples and takes up to `sampling_rate` evenly
//! spaced samples from it.

use super::Analyzer;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary statistics of the sampled bytes of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByteProfile {
    /// File size in bytes.
    pub size_bytes: u64,
    /// Number of samples taken.
    pub samples: usize,
    /// Mean sample value.
    pub mean: f64,
    /// Largest sample value.
    pub peak: u8,
    /// Fraction of samples equal to zero.
    pub zero_ratio: f64,
}

/// Reads the whole file and profiles it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteProfileAnalyzer;

#[async_trait]
impl Analyzer for ByteProfileAnalyzer {
    type Output = ByteProfile;

    async fn analyze(&self, path: &Path, sampling_rate: u32) -> Result<ByteProfile, AnalysisError> {
        let data = tokio::fs::read(path).await?;

        if data.is_empty() {
            return Err(AnalysisError::Failed("file is empty".to_string()));
        }

        Ok(profile_bytes(&data, sampling_rate))
    }

    fn name(&self) -> &str {
        "byte-profile"
    }
}

/// Profile a non-empty buffer using at most `sampling_rate` samples.
pub fn profile_bytes(data: &[u8], sampling_rate: u32) -> ByteProfile {
    let count = (sampling_rate as usize).clamp(1, data.len().max(1));
    let stride = (data.len() / count).max(1);

    let samples: Vec<u8> = data.iter().step_by(stride).take(count).copied().collect();

    let sum: u64 = samples.iter().map(|&b| b as u64).sum();
    let zeros = samples.iter().filter(|&&b| b == 0).count();
    let n = samples.len().max(1) as f64;

    ByteProfile {
        size_bytes: data.len() as u64,
        samples: samples.len(),
        mean: sum as f64 / n,
        peak: samples.iter().copied().max().unwrap_or(0),
        zero_ratio: zeros as f64 / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_bytes_caps_samples() {
        let data = vec![10u8; 1000];
        let profile = profile_bytes(&data, 30);
        assert_eq!(profile.samples, 30);
        assert_eq!(profile.size_bytes, 1000);
        assert_eq!(profile.mean, 10.0);
        assert_eq!(profile.peak, 10);
        assert_eq!(profile.zero_ratio, 0.0);
    }

    #[test]
    fn test_profile_bytes_short_input() {
        let data = [0u8, 255];
        let profile = profile_bytes(&data, 30);
        assert_eq!(profile.samples, 2);
        assert_eq!(profile.peak, 255);
        assert_eq!(profile.zero_ratio, 0.5);
    }

    #[tokio::test]
    async fn test_analyze_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mp4");
        std::fs::write(&path, vec![1u8; 64]).unwrap();

        let profile = ByteProfileAnalyzer.analyze(&path, 8).await.unwrap();
        assert_eq!(profile.samples, 8);
        assert_eq!(profile.size_bytes, 64);
    }

    #[tokio::test]
    async fn test_analyze_empty_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();

        let err = ByteProfileAnalyzer.analyze(&path, 8).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Failed(_)));
    }

    #[tokio::test]
    async fn test_analyze_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ByteProfileAnalyzer
            .analyze(&temp_dir.path().join("gone.mp4"), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
