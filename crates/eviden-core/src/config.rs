//! Narrator configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/eviden/config/narrator.toml) when it exists
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are not read here; callers layer them on top.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::BackendKind;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/narrator.toml");

/// Host and model for one backend kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub model: String,
}

/// Everything needed to construct a generative backend
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorConfig {
    /// Active backend
    pub backend: BackendKind,
    pub openai_compatible: EndpointConfig,
    pub ollama: EndpointConfig,
    /// Bearer token for OpenAI-compatible servers
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout applied on the HTTP client
    pub timeout: Duration,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::OpenAICompatible,
            openai_compatible: EndpointConfig {
                host: "https://api.openai.com".to_string(),
                model: "gpt-4-turbo-preview".to_string(),
            },
            ollama: EndpointConfig {
                host: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
            },
            api_key: None,
            temperature: 0.7,
            max_tokens: 1500,
            timeout: Duration::from_secs(60),
        }
    }
}

impl NarratorConfig {
    /// Load from `path`, else the data-dir override, else embedded defaults
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(default_path) => fs::read_to_string(&default_path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    fn endpoint(&self) -> &EndpointConfig {
        match self.backend {
            BackendKind::Ollama => &self.ollama,
            BackendKind::OpenAICompatible | BackendKind::Mock => &self.openai_compatible,
        }
    }

    fn endpoint_mut(&mut self) -> &mut EndpointConfig {
        match self.backend {
            BackendKind::Ollama => &mut self.ollama,
            BackendKind::OpenAICompatible | BackendKind::Mock => &mut self.openai_compatible,
        }
    }

    /// Host of the active backend
    pub fn host(&self) -> &str {
        &self.endpoint().host
    }

    /// Model of the active backend
    pub fn model(&self) -> &str {
        &self.endpoint().model
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.endpoint_mut().host = host.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.endpoint_mut().model = model.into();
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("eviden").join("config").join("narrator.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    narrator: Option<RawNarrator>,
    openai_compatible: Option<RawEndpoint>,
    ollama: Option<RawEndpoint>,
}

#[derive(Debug, Deserialize)]
struct RawNarrator {
    backend: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
}

/// Parse config from TOML content, over the built-in defaults
fn parse_config(content: &str) -> Result<NarratorConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = NarratorConfig::default();

    if let Some(narrator) = raw.narrator {
        if let Some(backend) = narrator.backend {
            config.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(temperature) = narrator.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = narrator.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(timeout) = narrator.timeout_secs {
            config.timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(openai) = raw.openai_compatible {
        apply_endpoint(&mut config.openai_compatible, &openai);
        if openai.api_key.is_some() {
            config.api_key = openai.api_key;
        }
    }

    if let Some(ollama) = raw.ollama {
        apply_endpoint(&mut config.ollama, &ollama);
    }

    Ok(config)
}

fn apply_endpoint(endpoint: &mut EndpointConfig, raw: &RawEndpoint) {
    if let Some(ref host) = raw.host {
        endpoint.host = host.clone();
    }
    if let Some(ref model) = raw.model {
        endpoint.model = model.clone();
    }
}
