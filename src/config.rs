use crate::error::{Result, VidsumError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How long audio is split before transcription.
///
/// `Auto` always processes the audio whole, regardless of duration. This
/// mirrors the behavior users already rely on, even though it bypasses the
/// long-audio threshold entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Auto,
    Equal,
    Timestamps,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Auto => write!(f, "auto"),
            Strategy::Equal => write!(f, "equal"),
            Strategy::Timestamps => write!(f, "timestamps"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "equal" => Ok(Strategy::Equal),
            "timestamps" => Ok(Strategy::Timestamps),
            _ => Err(format!(
                "Unknown partition strategy: {}. Use 'auto', 'equal', or 'timestamps'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub default_strategy: Strategy,
    pub chunk_count: usize,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            default_strategy: Strategy::default(),
            chunk_count: 4,
            output_dir: PathBuf::from("transcription_and_summaries"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(strategy) = std::env::var("VIDSUM_DEFAULT_STRATEGY") {
            if let Ok(s) = strategy.parse() {
                config.default_strategy = s;
            }
        }
        if let Ok(chunks) = std::env::var("VIDSUM_CHUNKS") {
            if let Ok(c) = chunks.parse() {
                config.chunk_count = c;
            }
        }
        if let Ok(dir) = std::env::var("VIDSUM_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.is_none() {
            return Err(VidsumError::Config(
                "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-...".to_string(),
            ));
        }

        if self.chunk_count == 0 {
            return Err(VidsumError::Config(
                "Chunk count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vidsum").join("config.toml"))
    }
}
