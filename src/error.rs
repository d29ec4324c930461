use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidsumError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Audio stream is empty (probed duration is zero)")]
    EmptyAudio,

    #[error("Segment cut failed: {0}")]
    SegmentCut(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VidsumError>;
