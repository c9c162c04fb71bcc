//! Mock backend for testing
//!
//! Returns a configurable canned narrative, an empty reply, or an error, and
//! counts how many completions were requested.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::NarrativeBackend;

/// Default canned narrative
pub const MOCK_NARRATIVE: &str = "## EXECUTIVE SUMMARY\n\nMock narrative.\n\n\
## KEY FINDINGS\n\n• Mock finding\n\n\
## ACTIONABLE RECOMMENDATIONS\n\n• Mock recommendation\n\n\
## RISKS & LIMITATIONS\n\n• Mock risk\n";

#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Text(String),
    Empty,
    Fail(String),
}

/// Mock generative backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    response: MockResponse,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Healthy backend returning `MOCK_NARRATIVE`
    pub fn new() -> Self {
        Self::with_response(MockResponse::Text(MOCK_NARRATIVE.to_string()))
    }

    pub fn with_response(response: MockResponse) -> Self {
        Self {
            healthy: true,
            response,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Backend whose completions always fail
    pub fn failing(message: &str) -> Self {
        Self::with_response(MockResponse::Fail(message.to_string()))
    }

    /// Backend that replies with whitespace only
    pub fn empty() -> Self {
        Self::with_response(MockResponse::Empty)
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Number of completions requested so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            MockResponse::Text(text) => Ok(text.clone()),
            MockResponse::Empty => Ok("   ".to_string()),
            MockResponse::Fail(message) => Err(Error::Backend(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls_across_clones() {
        let backend = MockBackend::new();
        let clone = backend.clone();
        clone.complete(&CompletionRequest::new("x")).await.unwrap();
        clone.complete(&CompletionRequest::new("y")).await.unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_failing_and_empty() {
        let failing = MockBackend::failing("boom");
        assert!(matches!(
            failing.complete(&CompletionRequest::new("x")).await,
            Err(Error::Backend(_))
        ));

        let empty = MockBackend::empty();
        let text = empty.complete(&CompletionRequest::new("x")).await.unwrap();
        assert!(text.trim().is_empty());
    }

    #[tokio::test]
    async fn test_mock_health() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
