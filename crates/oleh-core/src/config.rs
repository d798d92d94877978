use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OlehError, Result};

/// Fixed greeting that opens every conversation.
pub const DEFAULT_GREETING: &str =
    "Hello! I am your personal Aliyah assistant. Before we begin, what is your preferred language?";

/// Top-level configuration for OlehAssist.
///
/// Loaded from `~/.olehassist/config.toml` by default. Each section
/// corresponds to one external collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OlehConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl OlehConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OlehConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OlehError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the record database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.olehassist/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature. Model default when unset.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: None,
        }
    }
}

/// Knowledge-base search backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search API.
    pub endpoint: String,
    pub project_id: String,
    pub location: String,
    /// Search app (engine) identifier.
    pub app_id: String,
    pub serving_config: String,
    /// Results requested per query.
    pub page_size: u32,
    /// Extractive segments requested per result.
    pub max_extractive_segments: u32,
    /// Environment variable holding the OAuth access token.
    pub access_token_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://global-discoveryengine.googleapis.com/v1".to_string(),
            project_id: String::new(),
            location: "global".to_string(),
            app_id: String::new(),
            serving_config: "default_search".to_string(),
            page_size: 10,
            max_extractive_segments: 1,
            access_token_env: "GOOGLE_ACCESS_TOKEN".to_string(),
        }
    }
}

impl SearchConfig {
    /// Fully qualified serving config resource name.
    pub fn serving_config_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/collections/default_collection/engines/{}/servingConfigs/{}",
            self.project_id, self.location, self.app_id, self.serving_config
        )
    }
}

/// Structured record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Database file name inside the data directory.
    pub database_file: String,
    /// Table holding the Ministry of Aliyah branch directory.
    pub branch_table: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            database_file: "records.db".to_string(),
            branch_table: "ministry_of_aliyah_branch_info".to_string(),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether turns are accepted at all.
    pub enabled: bool,
    /// Assistant message that opens every session.
    pub greeting: String,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            greeting: DEFAULT_GREETING.to_string(),
            max_message_length: 4000,
        }
    }
}
