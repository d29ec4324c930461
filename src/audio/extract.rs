//! FFmpeg-backed media operations: probing, extraction, and range cuts.

use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Result, VidsumError};

use super::MediaBackend;

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg").arg("-version").output().map_err(|e| {
        VidsumError::SourceUnavailable(format!(
            "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(VidsumError::SourceUnavailable(
            "FFmpeg check failed".to_string(),
        ));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| {
            VidsumError::SourceUnavailable(format!(
                "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(VidsumError::SourceUnavailable(
            "FFprobe check failed".to_string(),
        ));
    }

    debug!("FFprobe is available");
    Ok(())
}

fn probe_duration(input: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .map_err(|e| VidsumError::SourceUnavailable(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidsumError::SourceUnavailable(format!(
            "FFprobe failed: {stderr}"
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str.trim().parse().map_err(|e| {
        VidsumError::SourceUnavailable(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })
}

/// Shared ffmpeg output arguments: mono 16kHz mp3 at 96kbps.
const AUDIO_ARGS: [&str; 9] = ["-vn", "-ar", "16000", "-ac", "1", "-b:a", "96k", "-f", "mp3"];

/// [`MediaBackend`] implementation over the ffmpeg/ffprobe command line tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    fn duration(&self, audio: &Path) -> f64 {
        match probe_duration(audio) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Duration probe failed for {}: {}", audio.display(), e);
                0.0
            }
        }
    }

    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()> {
        if !video.exists() {
            return Err(VidsumError::SourceUnavailable(video.display().to_string()));
        }

        info!("Extracting audio from {}", video.display());

        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .args(AUDIO_ARGS)
            .arg(dest)
            .status()
            .map_err(|e| {
                VidsumError::SourceUnavailable(format!("Failed to run FFmpeg: {e}"))
            })?;

        if !status.success() {
            return Err(VidsumError::SourceUnavailable(
                "FFmpeg audio extraction failed".to_string(),
            ));
        }

        if !dest.exists() {
            return Err(VidsumError::SourceUnavailable(
                "Output file was not created".to_string(),
            ));
        }

        info!("Audio extracted to {}", dest.display());
        Ok(())
    }

    async fn cut_range(
        &self,
        source: &Path,
        dest: &Path,
        start: f64,
        duration: f64,
    ) -> Result<()> {
        if !source.exists() {
            return Err(VidsumError::SegmentCut(source.display().to_string()));
        }

        let start_arg = format!("{start:.3}");
        let duration_arg = format!("{duration:.3}");

        debug!(
            "Cutting range: start={}, duration={}",
            start_arg, duration_arg
        );

        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-ss"])
            .arg(&start_arg)
            .arg("-t")
            .arg(&duration_arg)
            .arg("-i")
            .arg(source)
            .args(AUDIO_ARGS)
            .arg(dest)
            .status()
            .map_err(|e| VidsumError::SegmentCut(format!("Failed to run FFmpeg: {e}")))?;

        if !status.success() {
            return Err(VidsumError::SegmentCut(format!(
                "FFmpeg failed to cut {:.3}s at {:.3}s from {}",
                duration,
                start,
                source.display()
            )));
        }

        Ok(())
    }
}
