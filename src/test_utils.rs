//! Test utilities for PPLX
//!
//! This module provides common test utilities including temporary storage,
//! a scripted provider, and assertion helpers.

use crate::config::Config;
use crate::error::{PplxError, Result};
use crate::providers::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, Message, Provider, SearchResult,
};
use crate::storage::SessionStore;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Configuration with an API key and a sessions directory inside `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config {
        api_key: Some("test-key".to_string()),
        ..Config::default()
    };
    config.session.directory = dir.path().join("sessions");
    config
}

/// A store rooted in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (SessionStore, TempDir) {
    let dir = temp_dir();
    let store = SessionStore::new(dir.path().join("sessions"));
    (store, dir)
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A response with one assistant choice and the given search results
pub fn response_with(content: &str, search_results: Vec<SearchResult>) -> ChatCompletionResponse {
    ChatCompletionResponse {
        choices: vec![Choice {
            index: 0,
            finish_reason: Some("stop".to_string()),
            message: Message::assistant(content),
        }],
        search_results,
        ..Default::default()
    }
}

/// Provider that replays scripted responses and records every request
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<std::result::Result<ChatCompletionResponse, String>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl MockProvider {
    /// Create a provider with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn respond(self, response: ChatCompletionResponse) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(Ok(response));
        self
    }

    /// Queue a failure
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(Err(message.to_string()));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.requests
            .lock()
            .expect("mock lock poisoned")
            .push(request.clone());
        match self.responses.lock().expect("mock lock poisoned").pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(PplxError::Provider(message).into()),
            None => Err(PplxError::Provider("no scripted response".to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_test_config_is_valid() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert!(config.validate().is_ok());
        assert!(config.require_api_key().is_ok());
        assert!(config.session.directory.starts_with(dir.path()));
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(PplxError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[tokio::test]
    async fn test_mock_provider_replays_in_order() {
        let provider = MockProvider::new()
            .respond(response_with("first", vec![]))
            .fail("boom");
        let request = ChatCompletionRequest::new("sonar", vec![Message::user("hi")]);

        let first = provider.complete(&request).await.unwrap();
        assert_eq!(first.first_content(), Some("first"));
        assert_error_contains(provider.complete(&request).await, "boom");
        assert_error_contains(provider.complete(&request).await, "no scripted response");
        assert_eq!(provider.requests().len(), 3);
    }
}
