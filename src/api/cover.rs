//! Video cover extraction
//!
//! A video message needs a cover image. When the caller does not supply one,
//! the first decodable frame of the video is grabbed with `ffmpeg`. The
//! binary is optional: without it the extractor is [`CoverExtractor::Unavailable`]
//! and media sends without a cover degrade to a logged no-op.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::debug;
use tokio::process::Command;

use crate::error::FeishuError;

const FFMPEG_PROGRAM: &str = "ffmpeg";

/// Capability to derive a JPEG cover from a video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverExtractor {
    /// Extract frames by running the given ffmpeg executable
    Ffmpeg { program: PathBuf },
    Unavailable,
}

impl CoverExtractor {
    /// Probe `ffmpeg` on `PATH`.
    pub async fn detect() -> Self {
        Self::probe(FFMPEG_PROGRAM).await
    }

    /// Use `program` as the ffmpeg executable if `program -version` runs.
    pub async fn probe(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let available = Command::new(&program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);

        if available {
            CoverExtractor::Ffmpeg { program }
        } else {
            debug!("[FeishuBot] {} not found, cover extraction disabled", program.display());
            CoverExtractor::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CoverExtractor::Ffmpeg { .. })
    }

    /// Encode the first decodable frame of `video` as JPEG.
    ///
    /// # Errors
    /// - `FeishuError::Cover` if the capability is unavailable, ffmpeg exits
    ///   with failure, or no frame was produced
    /// - `FeishuError::Io` if ffmpeg cannot be spawned
    pub async fn extract_first_frame(&self, video: &Path) -> Result<Vec<u8>, FeishuError> {
        let program = match self {
            CoverExtractor::Ffmpeg { program } => program,
            CoverExtractor::Unavailable => {
                return Err(FeishuError::Cover("ffmpeg is not available".to_string()))
            }
        };

        let output = Command::new(program)
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-f", "image2pipe", "-c:v", "mjpeg", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(FeishuError::Cover(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(FeishuError::Cover(format!(
                "no decodable frame in {}",
                video.display()
            )));
        }

        Ok(output.stdout)
    }
}
