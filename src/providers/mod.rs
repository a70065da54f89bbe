//! Provider module for PPLX
//!
//! This module contains the remote completion abstraction and the
//! Perplexity implementation.

pub mod base;
pub mod perplexity;

pub use base::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, Message, Provider, SearchResult, Usage,
    WebSearchOptions,
};
pub use perplexity::PerplexityProvider;

use crate::config::Config;

/// Build a request carrying the configured sampling and search parameters
///
/// Zero `max_tokens` and empty string settings are left unset so the API
/// applies its own defaults.
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `model` - Model for this request (a continued session keeps its own)
/// * `messages` - Context window plus the new user turn
pub fn build_request(config: &Config, model: &str, messages: Vec<Message>) -> ChatCompletionRequest {
    fn non_empty(s: &str) -> Option<String> {
        (!s.trim().is_empty()).then(|| s.to_string())
    }

    let mut request = ChatCompletionRequest::new(model, messages);
    request.max_tokens = (config.max_tokens > 0).then_some(config.max_tokens);
    request.temperature = Some(config.temperature);
    request.top_p = Some(config.top_p);
    request.search_mode = non_empty(&config.search_mode);
    request.reasoning_effort = non_empty(&config.reasoning_effort);
    request.web_search_options =
        non_empty(&config.search_context_size).map(|size| WebSearchOptions {
            search_context_size: size,
        });
    request
}
