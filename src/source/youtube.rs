//! YouTube audio download and metadata retrieval via yt-dlp.

use std::path::Path;
use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, VidsumError};

const YT_DLP: &str = "yt-dlp";

/// Title and description of a video, fetched without downloading it.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

/// Check if yt-dlp is installed and accessible.
pub async fn check_yt_dlp() -> Result<()> {
    let output = Command::new(YT_DLP)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            VidsumError::SourceUnavailable(format!(
                "yt-dlp not found. Install it from https://github.com/yt-dlp/yt-dlp. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(VidsumError::SourceUnavailable(
            "yt-dlp check failed".to_string(),
        ));
    }

    debug!("yt-dlp is available");
    Ok(())
}

/// Fetch video title and description without downloading media.
pub async fn fetch_metadata(url: &str) -> Result<VideoMetadata> {
    debug!("Fetching video metadata for {}", url);

    let output = Command::new(YT_DLP)
        .args(["--dump-json", "--no-playlist", "--quiet", url])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| VidsumError::SourceUnavailable(format!("Failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidsumError::SourceUnavailable(format!(
            "yt-dlp metadata fetch failed: {stderr}"
        )));
    }

    let info: Value = serde_json::from_slice(&output.stdout)?;

    Ok(VideoMetadata {
        title: info["title"].as_str().unwrap_or("output").to_string(),
        description: info["description"].as_str().unwrap_or_default().to_string(),
    })
}

/// Download a video's audio track as mp3 to `dest`.
pub async fn download_audio(url: &str, dest: &Path) -> Result<()> {
    info!("Downloading YouTube audio from {}", url);

    // yt-dlp's mp3 postprocessor appends the extension itself.
    let template = dest.with_extension("");

    let output = Command::new(YT_DLP)
        .args([
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "96K",
            "--format",
            "bestaudio/best",
            "--no-playlist",
            "--quiet",
            "--output",
        ])
        .arg(&template)
        .arg(url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| VidsumError::SourceUnavailable(format!("Failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidsumError::SourceUnavailable(format!(
            "yt-dlp download failed: {stderr}"
        )));
    }

    if !dest.exists() {
        return Err(VidsumError::SourceUnavailable(
            "yt-dlp did not produce the expected audio file".to_string(),
        ));
    }

    info!("Audio downloaded to {}", dest.display());
    Ok(())
}
