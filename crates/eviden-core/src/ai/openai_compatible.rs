//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - OpenAI (https://api.openai.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI / llama-server (http://localhost:8080)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::NarrativeBackend;

/// OpenAI-compatible backend
///
/// Posts to `{base_url}/v1/chat/completions`, with a bearer token when an API
/// key is set. The HTTP client carries the request timeout.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new backend with the given request timeout
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        })
    }

    /// Create with an API key
    pub fn with_api_key(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut backend = Self::new(base_url, model, timeout)?;
        backend.api_key = Some(api_key.to_string());
        Ok(backend)
    }
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    /// Null for refusals and tool-only replies
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionRequest {
    fn from_request(model: &str, request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        Self {
            model: model.to_string(),
            messages,
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            stream: false,
        }
    }
}

#[async_trait]
impl NarrativeBackend for OpenAICompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionRequest::from_request(&self.model, request);

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Backend("No response from OpenAI API".into()))?;

        debug!(model = %self.model, chars = content.len(), "OpenAI-compatible completion");
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        // /v1/models is the standard endpoint; some local servers only expose /health
        for path in ["/v1/models", "/health"] {
            let mut req = self.http_client.get(format!("{}{}", self.base_url, path));
            if let Some(ref api_key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
            if let Ok(resp) = req.send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }
        false
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

    fn backend(url: &str) -> OpenAICompatibleBackend {
        OpenAICompatibleBackend::new(url, "gpt-4-turbo-preview", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = backend("https://api.openai.com/");
        assert_eq!(backend.host(), "https://api.openai.com");
        assert_eq!(backend.model(), "gpt-4-turbo-preview");
    }

    #[test]
    fn test_backend_with_api_key() {
        let backend = OpenAICompatibleBackend::with_api_key(
            "http://localhost:8000",
            "gpt-4",
            "sk-test123",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.api_key, Some("sk-test123".to_string()));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = backend("http://127.0.0.1:9");
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_chat_completion_request_serialization() {
        let request = CompletionRequest::new("Analyze")
            .with_system("You are an analyst")
            .with_sampling(0.7, 1500);
        let body = ChatCompletionRequest::from_request("gpt-4", &request);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Analyze");
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 0.001);
        assert_eq!(json["max_tokens"], 1500);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_request_without_system_message() {
        let body = ChatCompletionRequest::from_request("gpt-4", &CompletionRequest::new("hi"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn test_chat_completion_response_deserialization() {
        let json = r###"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "## EXECUTIVE SUMMARY"},
                "finish_reason": "stop"
            }]
        }"###;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("## EXECUTIVE SUMMARY")
        );

        let null_content = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(null_content).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
