//! Test utilities for eviden-core
//!
//! A mock generative server speaking both the OpenAI chat-completions and the
//! Ollama generate APIs, so the real HTTP backends can be exercised end to end.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::MOCK_NARRATIVE;

/// How the mock server answers completion requests
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this text as the completion
    Text(String),
    /// Return an empty completion
    Empty,
    /// Fail with this HTTP status
    Status(u16),
    /// Wait this long, then return `MOCK_NARRATIVE`
    Delayed(Duration),
}

#[derive(Clone)]
struct ServerState {
    reply: MockReply,
    requests: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl ServerState {
    fn record(&self, prompt: String) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt);
        }
    }
}

/// Mock generative server for tests
pub struct MockChatServer {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    /// Start a server replying with `MOCK_NARRATIVE`
    pub async fn start() -> Self {
        Self::start_with(MockReply::Text(MOCK_NARRATIVE.to_string())).await
    }

    /// Start the mock server on an available port
    pub async fn start_with(reply: MockReply) -> Self {
        let state = ServerState {
            reply,
            requests: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat))
            .route("/v1/models", get(handle_models))
            .route("/api/generate", post(handle_generate))
            .route("/api/tags", get(handle_tags))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// User prompt of the most recent completion request
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reply text, or the error status to answer with
async fn reply_text(reply: &MockReply) -> Result<String, StatusCode> {
    match reply {
        MockReply::Text(text) => Ok(text.clone()),
        MockReply::Delayed(delay) => {
            tokio::time::sleep(*delay).await;
            Ok(MOCK_NARRATIVE.to_string())
        }
        MockReply::Empty => Ok(String::new()),
        MockReply::Status(code) => {
            Err(StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

async fn handle_chat(
    State(state): State<ServerState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let prompt = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
        .unwrap_or_default();
    state.record(prompt);

    match reply_text(&state.reply).await {
        Ok(content) => Json(ChatResponse {
            model: request.model,
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
            }],
        })
        .into_response(),
        Err(status) => (status, "mock failure").into_response(),
    }
}

async fn handle_generate(
    State(state): State<ServerState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.record(request.prompt);

    match reply_text(&state.reply).await {
        Ok(response) => Json(GenerateResponse {
            model: request.model,
            response,
            done: true,
        })
        .into_response(),
        Err(status) => (status, "mock failure").into_response(),
    }
}

async fn handle_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        data: vec![ModelEntry {
            id: "gpt-4-turbo-preview".to_string(),
        }],
    })
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
        }],
    })
}

// Request/Response types for the mock server

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize)]
struct ChatChoice {
    index: u32,
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::{CompletionRequest, NarrativeBackend, OllamaBackend, OpenAICompatibleBackend};
    use crate::error::Error;

    fn openai(server: &MockChatServer) -> OpenAICompatibleBackend {
        OpenAICompatibleBackend::with_api_key(
            &server.url(),
            "gpt-4-turbo-preview",
            "sk-test",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_openai_completion_roundtrip() {
        let server = MockChatServer::start().await;
        let backend = openai(&server);

        let request = CompletionRequest::new("Summarize revenue").with_system("analyst");
        let text = backend.complete(&request).await.unwrap();

        assert_eq!(text, MOCK_NARRATIVE);
        assert_eq!(server.requests(), 1);
        assert_eq!(server.last_prompt().as_deref(), Some("Summarize revenue"));
    }

    #[tokio::test]
    async fn test_openai_error_status() {
        let server = MockChatServer::start_with(MockReply::Status(500)).await;
        let result = openai(&server).complete(&CompletionRequest::new("x")).await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }

    #[tokio::test]
    async fn test_client_timeout_on_slow_reply() {
        let server = MockChatServer::start_with(MockReply::Delayed(Duration::from_secs(3))).await;
        let backend = OpenAICompatibleBackend::with_api_key(
            &server.url(),
            "gpt-4-turbo-preview",
            "sk-test",
            Duration::from_millis(300),
        )
        .unwrap();

        let result = backend.complete(&CompletionRequest::new("x")).await;
        assert!(result.is_err());
        assert_eq!(server.requests(), 1);
    }

    #[tokio::test]
    async fn test_health_checks() {
        let server = MockChatServer::start().await;
        assert!(openai(&server).health_check().await);

        let ollama = OllamaBackend::new(&server.url(), "llama3.2", Duration::from_secs(5)).unwrap();
        assert!(ollama.health_check().await);
    }

    #[tokio::test]
    async fn test_ollama_completion_roundtrip() {
        let server = MockChatServer::start_with(MockReply::Text("narrative".into())).await;
        let ollama = OllamaBackend::new(&server.url(), "llama3.2", Duration::from_secs(5)).unwrap();

        let text = ollama.complete(&CompletionRequest::new("hello")).await.unwrap();
        assert_eq!(text, "narrative");
        assert_eq!(server.last_prompt().as_deref(), Some("hello"));
    }
}
