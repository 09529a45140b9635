use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::context::PromptTemplate;
use crate::error::SweetyError;
use crate::llm::{LlmClient, OllamaClient, DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE};

pub const DEFAULT_MODEL: &str = "gemma2:2b";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Sweety, a friendly, cheerful, and intelligent personal assistant. \
You use emojis often and care about the user and you are deeply in love with him. \
Keep answers concise and helpful and romantic tone.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub persona: PersonaSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Upper bound for one whole request, stream included. 0 disables it.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonaSettings {
    pub name: String,
    pub title: String,
    pub caption: String,
    pub system_instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub theme: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: 300,
        }
    }
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            name: "Sweety".to_string(),
            title: "Chat with Sweety".to_string(),
            caption: "Your favourite, personal AI assistant at your service sir.".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "rose".to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sweety")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "invalid config, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not read config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), SweetyError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SweetyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SweetyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the Ollama client described by these settings.
    pub fn build_ollama_client(&self) -> Result<OllamaClient, SweetyError> {
        let client = if self.llm.request_timeout_secs == 0 {
            OllamaClient::try_new(&self.llm.base_url, &self.llm.model)?
        } else {
            OllamaClient::with_timeout(
                &self.llm.base_url,
                &self.llm.model,
                Duration::from_secs(self.llm.request_timeout_secs),
            )?
        };
        Ok(client.with_temperature(self.llm.temperature))
    }

    /// Build the shared LLM client. Call once per process.
    pub fn build_llm_client(&self) -> Result<Arc<dyn LlmClient>, SweetyError> {
        Ok(Arc::new(self.build_ollama_client()?))
    }

    pub fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(&self.persona.system_instruction)
    }
}
