//! Speech-to-text client with per-call cost estimation.

use crate::audio::AudioUnit;
use crate::error::{Result, VidsumError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// OpenAI Whisper transcription endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Whisper pricing: $0.006 per minute of audio.
pub const WHISPER_COST_PER_MINUTE: f64 = 0.006;

/// A transcription result with its estimated cost.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    /// Estimated cost in USD.
    pub cost: f64,
}

/// Speech-to-text capability consumed by the pipeline.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, unit: &AudioUnit) -> Result<Transcription>;
    fn name(&self) -> &'static str;
}

/// OpenAI Whisper API client.
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WhisperClient {
    /// Create a new Whisper client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: WHISPER_API_URL.to_string(),
        }
    }

    /// Override the API endpoint (used by tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        Ok(Form::new()
            .part("file", file_part)
            .text("model", "whisper-1"))
    }
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub(crate) error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, unit: &AudioUnit) -> Result<Transcription> {
        let form = self.build_form(&unit.path).await?;

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(VidsumError::Transcription(format!(
                    "Whisper API error: {} ({})",
                    api_error.error.message, api_error.error.kind
                )));
            }
            return Err(VidsumError::Transcription(format!(
                "Whisper API returned {status}: {body}"
            )));
        }

        let parsed: WhisperResponse = response.json().await?;

        let minutes = unit.segment.duration / 60.0;
        let cost = minutes * WHISPER_COST_PER_MINUTE;

        Ok(Transcription {
            text: parsed.text,
            cost,
        })
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}
