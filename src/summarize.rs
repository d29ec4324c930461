//! Markdown summarization client with token-based cost estimation.

use crate::error::{Result, VidsumError};
use crate::transcribe::ApiErrorResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OpenAI chat completions endpoint.
const CHAT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// GPT-4o pricing per 1K tokens.
pub const GPT4O_INPUT_COST_PER_K: f64 = 0.005;
pub const GPT4O_OUTPUT_COST_PER_K: f64 = 0.015;

const SYSTEM_PROMPT: &str = "You are an expert in summarizing video transcripts. \
Read the provided transcript and produce a concise summary capturing the main ideas, \
key points, and conclusion. Use Markdown formatting for headers, bullet lists, and \
emphasis. The transcript can be in Portuguese (Brazilian) or English. Ensure the \
summary is in the same language as the transcript.";

/// A summary result with its estimated cost.
#[derive(Debug, Clone)]
pub struct Summary {
    pub markdown: String,
    /// Estimated cost in USD.
    pub cost: f64,
}

/// Text summarization capability consumed by the pipeline.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<Summary>;
    fn name(&self) -> &'static str;
}

/// OpenAI chat completions summarizer.
pub struct ChatSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ChatSummarizer {
    /// Create a new summarizer with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: "gpt-4o".to_string(),
            base_url: CHAT_API_URL.to_string(),
        }
    }

    /// Set a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API endpoint (used by tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("Chat API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(VidsumError::Summarization(format!(
                    "Chat API error: {} ({})",
                    api_error.error.message, api_error.error.kind
                )));
            }
            return Err(VidsumError::Summarization(format!(
                "Chat API returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;

        let markdown = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                VidsumError::Summarization("Chat API returned no choices".to_string())
            })?;

        let input_cost = (parsed.usage.prompt_tokens as f64 / 1000.0) * GPT4O_INPUT_COST_PER_K;
        let output_cost =
            (parsed.usage.completion_tokens as f64 / 1000.0) * GPT4O_OUTPUT_COST_PER_K;

        Ok(Summary {
            markdown,
            cost: input_cost + output_cost,
        })
    }

    fn name(&self) -> &'static str {
        "OpenAI GPT-4o"
    }
}
