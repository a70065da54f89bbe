//! Base provider trait and wire types for PPLX
//!
//! This module defines the Provider trait that the remote completion client
//! implements, along with the chat-completions request and response shapes
//! exchanged with the API.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for the completion request
///
/// Represents a single turn sent to, or returned by, the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Creates a message with an explicit role
    ///
    /// # Arguments
    ///
    /// * `role` - Wire role name
    /// * `content` - The message content
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use pplx::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use pplx::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Whether this message was produced by the model
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// A web search result attached to a single response
///
/// Citations `[N]` in the response content point at `search_results[N - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Publication date, when the API knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl SearchResult {
    /// Creates a search result without a date
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date: None,
        }
    }
}

/// Search tuning forwarded with the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchOptions {
    /// How much retrieved context the API should use (low, medium, high)
    pub search_context_size: String,
}

/// Request body for the chat completions endpoint
///
/// Unset optional fields are omitted from the JSON so the API applies its
/// own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name
    pub model: String,
    /// Conversation turns, oldest first
    pub messages: Vec<Message>,
    /// Maximum completion tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Search mode (web, academic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<String>,
    /// Reasoning effort for reasoning models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    /// Search tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search_options: Option<WebSearchOptions>,
}

impl ChatCompletionRequest {
    /// Creates a request with only model and messages set
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            top_p: None,
            search_mode: None,
            reasoning_effort: None,
            web_search_options: None,
        }
    }
}

/// Token accounting returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u64,
    /// Prompt plus completion
    #[serde(default)]
    pub total_tokens: u64,
    /// Context size the search actually used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<String>,
    /// Tokens spent on citations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_tokens: Option<u64>,
    /// Number of searches performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_search_queries: Option<u64>,
    /// Tokens spent reasoning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

/// A completion choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Position in the choices array
    #[serde(default)]
    pub index: u32,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Generated message
    pub message: Message,
}

/// Response body from the chat completions endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response id
    #[serde(default)]
    pub id: String,
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// Unix creation time
    #[serde(default)]
    pub created: i64,
    /// Object type
    #[serde(default)]
    pub object: String,
    /// Token usage
    #[serde(default)]
    pub usage: Usage,
    /// Completion choices
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Search results referenced by `[N]` citations
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Remote completion collaborator
///
/// Implementations own transport, authentication, and retry policy. Callers
/// treat any error as an opaque failure of the turn.
///
/// # Examples
///
/// ```
/// use pplx::providers::{ChatCompletionRequest, ChatCompletionResponse, Provider};
/// use pplx::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(&self, _request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
///         Ok(ChatCompletionResponse::default())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let request = ChatCompletionRequest::new("sonar", vec![]);
/// let response = EchoProvider.complete(&request).await.unwrap();
/// assert!(response.first_content().is_none());
/// # });
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends a chat completion request
    ///
    /// # Arguments
    ///
    /// * `request` - Fully populated request body
    ///
    /// # Returns
    ///
    /// Returns the decoded response, including any search results
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be delivered or the API reports failure
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;

    /// Default model used when a request leaves the model empty
    fn model(&self) -> &str {
        ""
    }
}
