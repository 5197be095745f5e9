//! Configuration management for gemchat
//!
//! Loads configuration with priority:
//! 1. config.toml (or specified config file)
//! 2. Environment variables (fallback)
//! 3. Defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables consulted for the API credential, in order
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Shown when no API key is found in the config file or the environment
pub const MISSING_API_KEY: &str =
    "API_KEY is not configured. Please set it in your environment variables.";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful and creative assistant. Format your responses with markdown where appropriate.";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Largest attachment accepted by default (4 MiB)
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 4 * 1024 * 1024;

/// gemchat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub chat: TurnConfig,

    #[serde(default)]
    pub attachments: AttachmentConfig,
}

/// Credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// API key (can reference env var with ${VAR_NAME})
    pub api_key: Option<String>,
}

/// Model/LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

/// Per-turn behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Seconds to wait for the next chunk before failing the turn.
    /// Unset means wait forever.
    pub turn_timeout_secs: Option<u64>,
}

/// Attachment limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_name: default_model_name(),
            base_url: default_base_url(),
            system_instruction: default_system_instruction(),
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

impl TurnConfig {
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }
}

impl ChatConfig {
    /// Load configuration with the following priority:
    /// 1. config.toml in current directory or a parent
    /// 2. Environment variables (fallback)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config.toml found, using environment configuration");
                Ok(Self::from_env())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading configuration from: {:?}", path);

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: ChatConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.resolve_env_vars();

        Ok(config)
    }

    /// Configuration built from defaults plus the credential in the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.resolve_env_vars();
        config
    }

    /// Find config.toml by searching current directory and parents
    fn find_config_file() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;

        loop {
            let config_path = current.join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolve ${VAR_NAME} references and fall back to the credential variables
    fn resolve_env_vars(&mut self) {
        let resolved = self
            .auth
            .api_key
            .as_deref()
            .and_then(Self::resolve_env_var)
            .filter(|key| !key.is_empty());

        self.auth.api_key = resolved.or_else(Self::api_key_from_env);

        if let Some(resolved) = Self::resolve_env_var(&self.model.base_url) {
            self.model.base_url = resolved;
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    fn api_key_from_env() -> Option<String> {
        API_KEY_VARS
            .iter()
            .find_map(|var| env::var(var).ok().filter(|key| !key.is_empty()))
    }

    /// Create test-friendly defaults (no environment access)
    pub fn test_defaults() -> Self {
        Self {
            auth: AuthConfig {
                api_key: Some("test-api-key".to_string()),
            },
            model: ModelConfig {
                provider: "test".to_string(),
                ..ModelConfig::default()
            },
            chat: TurnConfig::default(),
            attachments: AttachmentConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}
