use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BuzzError, Result};

/// Top-level configuration for the Buzz service.
///
/// Loaded from `~/.buzz/config.toml` by default. Every section is optional;
/// missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuzzConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl BuzzConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BuzzConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file if it exists.
    ///
    /// A missing file yields `Ok(None)` so the caller can fall back to
    /// defaults. A file that exists but cannot be read or parsed is an error.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(BuzzError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.completion.model.trim().is_empty() {
            return Err(BuzzError::Config("completion.model must not be empty".into()));
        }
        let base = self.completion.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(BuzzError::Config(format!(
                "completion.base_url must be an http(s) URL, got '{}'",
                self.completion.base_url
            )));
        }
        if self.completion.api_key_env.trim().is_empty() {
            return Err(BuzzError::Config(
                "completion.api_key_env must name an environment variable".into(),
            ));
        }
        if self.completion.request_timeout_secs == Some(0) {
            return Err(BuzzError::Config(
                "completion.request_timeout_secs must be positive when set".into(),
            ));
        }
        if self.chat.max_message_chars == 0 {
            return Err(BuzzError::Config("chat.max_message_chars must be positive".into()));
        }
        if self.chat.session_timeout_minutes == 0 {
            return Err(BuzzError::Config(
                "chat.session_timeout_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Hosted completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Optional request timeout. Unset means the transport default applies.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl CompletionConfig {
    /// Read the API key from the process environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Read the API key through `lookup`. Blank values count as missing.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(BuzzError::MissingCredential(self.api_key_env.clone())),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted length of one user message, in characters.
    pub max_message_chars: usize,
    /// Number of prior messages sent with each request. `0` sends all of them.
    pub history_window: usize,
    /// Minutes of inactivity after which a session ends.
    pub session_timeout_minutes: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 4000,
            history_window: 0,
            session_timeout_minutes: 60,
        }
    }
}
