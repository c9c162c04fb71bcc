//! Pluggable generative backend abstraction
//!
//! # Architecture
//!
//! - `NarrativeBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `OllamaBackend`, `MockBackend`
//!
//! Backends are built from an explicit `NarratorConfig`; nothing here reads
//! the environment.

mod mock;
mod ollama;
mod openai_compatible;
pub mod types;

pub use mock::{MockBackend, MockResponse, MOCK_NARRATIVE};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::config::NarratorConfig;
use crate::error::{Error, Result};

/// Trait defining the interface for all generative backends
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Generate text for a single prompt
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model identifier reported in narrative metadata
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// OpenAI-compatible chat completions
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build the client described by a narrator config
    ///
    /// Fails with `Error::Config` when the config is incomplete (an
    /// OpenAI-compatible backend without an API key) and with `Error::Http`
    /// when the HTTP client cannot be constructed.
    pub fn from_config(config: &NarratorConfig) -> Result<Self> {
        match config.backend {
            BackendKind::OpenAICompatible => {
                let api_key = config
                    .api_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| Error::Config("no API key configured".into()))?;
                OpenAICompatibleBackend::with_api_key(
                    config.host(),
                    config.model(),
                    api_key,
                    config.timeout,
                )
                .map(AIClient::OpenAICompatible)
            }
            BackendKind::Ollama => {
                OllamaBackend::new(config.host(), config.model(), config.timeout)
                    .map(AIClient::Ollama)
            }
            BackendKind::Mock => Ok(AIClient::Mock(MockBackend::new())),
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            AIClient::OpenAICompatible(_) => BackendKind::OpenAICompatible,
            AIClient::Ollama(_) => BackendKind::Ollama,
            AIClient::Mock(_) => BackendKind::Mock,
        }
    }
}

// Implement NarrativeBackend for AIClient by delegating to the inner backend
#[async_trait]
impl NarrativeBackend for AIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.complete(request).await,
            AIClient::Ollama(b) => b.complete(request).await,
            AIClient::Mock(b) => b.complete(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.kind(), BackendKind::Mock);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(AIClient::mock().health_check().await);
    }

    #[test]
    fn test_from_config_requires_api_key_for_openai() {
        let config = NarratorConfig::default();
        assert_eq!(config.backend, BackendKind::OpenAICompatible);
        assert!(matches!(
            AIClient::from_config(&config),
            Err(Error::Config(_))
        ));

        let blank = NarratorConfig {
            api_key: Some("  ".into()),
            ..NarratorConfig::default()
        };
        assert!(AIClient::from_config(&blank).is_err());

        let keyed = NarratorConfig {
            api_key: Some("sk-test".into()),
            ..NarratorConfig::default()
        };
        let client = AIClient::from_config(&keyed).unwrap();
        assert_eq!(client.kind(), BackendKind::OpenAICompatible);
        assert_eq!(client.model(), "gpt-4-turbo-preview");
    }

    #[test]
    fn test_from_config_ollama_needs_no_key() {
        let mut config = NarratorConfig::default();
        config.backend = BackendKind::Ollama;
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("openai".parse::<BackendKind>(), Ok(BackendKind::OpenAICompatible));
        assert_eq!("Ollama".parse::<BackendKind>(), Ok(BackendKind::Ollama));
        assert!("anthropic".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::OpenAICompatible.to_string(), "openai_compatible");
    }
}
