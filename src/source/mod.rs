//! Input resolution: turning a URL or local file into extracted audio.

pub mod youtube;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::audio::MediaBackend;
use crate::error::{Result, VidsumError};
use crate::output::clean_filename;

/// Where the video comes from. Anything starting with `http` is treated as a
/// YouTube URL; everything else is a local file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    YouTube(String),
    LocalFile(PathBuf),
}

impl InputSource {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http") {
            InputSource::YouTube(input.to_string())
        } else {
            InputSource::LocalFile(PathBuf::from(input))
        }
    }

    pub fn is_youtube(&self) -> bool {
        matches!(self, InputSource::YouTube(_))
    }
}

/// Extracted audio plus the metadata the pipeline needs.
#[derive(Debug, Clone)]
pub struct AcquiredAudio {
    /// Path to the extracted mp3 inside the run's working directory.
    pub audio_path: PathBuf,
    /// Sanitized base name for output artifacts.
    pub base_name: String,
    /// Video description text; empty for local files.
    pub description: String,
}

/// Download or extract the source's audio track into `workdir`.
pub async fn acquire(
    source: &InputSource,
    backend: &dyn MediaBackend,
    workdir: &Path,
) -> Result<AcquiredAudio> {
    let audio_path = workdir.join("output.mp3");

    match source {
        InputSource::YouTube(url) => {
            info!("Processing YouTube URL");
            let metadata = youtube::fetch_metadata(url).await?;
            youtube::download_audio(url, &audio_path).await?;

            Ok(AcquiredAudio {
                audio_path,
                base_name: clean_filename(&metadata.title),
                description: metadata.description,
            })
        }
        InputSource::LocalFile(path) => {
            info!("Processing local video file");
            if !path.exists() {
                return Err(VidsumError::SourceUnavailable(path.display().to_string()));
            }

            backend.extract_audio(path, &audio_path).await?;

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());

            Ok(AcquiredAudio {
                audio_path,
                base_name: clean_filename(&stem),
                description: String::new(),
            })
        }
    }
}
