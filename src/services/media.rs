//! ffprobe/ffmpeg wrappers
//!
//! Audio is converted to headerless 16 kHz mono s16le PCM, which the
//! transcriber reads directly.

use super::{MediaTools, ServiceError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

pub const SAMPLE_RATE: u32 = 16_000;

/// Extension of converted files
pub const CANONICAL_EXT: &str = "pcm";

#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl FfmpegTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that both binaries are on PATH
    pub async fn ensure_installed(&self) -> Result<(), ServiceError> {
        for bin in [&self.ffmpeg, &self.ffprobe] {
            let status = Command::new(bin)
                .arg("-version")
                .output()
                .await
                .map_err(|e| ServiceError::Conversion(format!("{} not found: {}", bin, e)))?
                .status;
            if !status.success() {
                return Err(ServiceError::Conversion(format!("{} -version exited with {}", bin, status)));
            }
        }
        Ok(())
    }
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration(stdout: &str) -> f64 {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .unwrap_or(0.0)
}

pub fn canonical_path(src: &Path) -> PathBuf {
    src.with_extension(CANONICAL_EXT)
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn probe_duration(&self, path: &Path) -> f64 {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                parse_duration(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!("ffprobe exited with {} for {:?}", output.status, path);
                0.0
            }
            Err(e) => {
                warn!("Failed to run ffprobe: {}", e);
                0.0
            }
        }
    }

    async fn convert_to_canonical(&self, path: &Path) -> Result<PathBuf, ServiceError> {
        let out = canonical_path(path);
        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(path)
            .args(["-ac", "1", "-ar"])
            .arg(SAMPLE_RATE.to_string())
            .args(["-f", "s16le", "-c:a", "pcm_s16le"])
            .arg(&out)
            .output()
            .await
            .map_err(|e| ServiceError::Conversion(format!("ffmpeg not available: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().last().unwrap_or("").to_string();
            return Err(ServiceError::Conversion(format!("ffmpeg exited with {}: {}", output.status, tail)));
        }

        debug!("Converted {:?} -> {:?}", path, out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n"), 12.48);
        assert_eq!(parse_duration("N/A"), 0.0);
        assert_eq!(parse_duration(""), 0.0);
        assert_eq!(parse_duration("-3"), 0.0);
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(
            canonical_path(Path::new("/tmp/job_1/voice.ogg")),
            PathBuf::from("/tmp/job_1/voice.pcm")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let tools = FfmpegTools {
            ffmpeg: "definitely-not-ffmpeg-binary".to_string(),
            ffprobe: "definitely-not-ffprobe-binary".to_string(),
        };
        let result = tools.convert_to_canonical(Path::new("/tmp/none.ogg")).await;
        assert!(matches!(result, Err(ServiceError::Conversion(_))));
        assert_eq!(tools.probe_duration(Path::new("/tmp/none.ogg")).await, 0.0);
        assert!(tools.ensure_installed().await.is_err());
    }
}
