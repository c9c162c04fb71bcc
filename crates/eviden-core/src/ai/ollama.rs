//! Ollama backend implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::NarrativeBackend;

/// Ollama backend over the `/api/generate` endpoint
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl NarrativeBackend for OllamaBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("Ollama error {}: {}", status, body)));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = %self.model, chars = ollama_response.response.len(), "Ollama completion");

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new() {
        let backend = OllamaBackend::new(
            "http://localhost:11434/",
            "llama3.2",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_request_serialization() {
        let body = OllamaRequest {
            model: "llama3.2".into(),
            prompt: "Analyze".into(),
            system: None,
            stream: false,
            options: OllamaOptions {
                temperature: 0.7,
                num_predict: 1500,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["prompt"], "Analyze");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1500);
        assert!(json.get("system").is_none());
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend =
            OllamaBackend::new("http://127.0.0.1:9", "llama3.2", Duration::from_secs(2)).unwrap();
        assert!(!backend.health_check().await);
    }
}
