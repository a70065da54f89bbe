//! Perplexity provider implementation for PPLX
//!
//! Sends chat completion requests to the Perplexity Sonar API over HTTPS with
//! bearer authentication. Transport failures are retried with linear backoff;
//! HTTP error statuses are returned to the caller immediately.

use crate::config::{ApiConfig, Config};
use crate::error::{PplxError, Result};
use crate::providers::{ChatCompletionRequest, ChatCompletionResponse, Provider};

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Perplexity Sonar API provider
///
/// # Examples
///
/// ```no_run
/// use pplx::config::Config;
/// use pplx::providers::{ChatCompletionRequest, Message, PerplexityProvider, Provider};
///
/// # async fn example() -> pplx::error::Result<()> {
/// let mut config = Config::default();
/// config.api_key = Some("pplx-...".to_string());
/// let provider = PerplexityProvider::from_config(&config)?;
/// let request = ChatCompletionRequest::new("sonar", vec![Message::user("Hello!")]);
/// let response = provider.complete(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct PerplexityProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl PerplexityProvider {
    /// Create a new provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the API
    /// * `model` - Model used when a request leaves `model` empty
    /// * `api` - Endpoint, timeout, and retry settings
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, api: &ApiConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PplxError::Config("API key is required".to_string()).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .user_agent(concat!("pplx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PplxError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let model = model.into();
        tracing::debug!(
            "Initialized Perplexity provider: endpoint={}, model={}",
            api.endpoint,
            model
        );

        Ok(Self {
            client,
            api_key,
            endpoint: api.endpoint.clone(),
            model,
            max_retries: api.max_retries,
            retry_delay: Duration::from_millis(api.retry_delay_ms),
        })
    }

    /// Create a provider from the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.require_api_key()?, config.model.clone(), &config.api)
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_with_retries(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.retry_delay * (attempt + 1);
                    tracing::warn!(
                        "Request attempt {} failed: {}; retrying in {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Request failed after {} attempts: {}", attempt + 1, e);
                    return Err(PplxError::Provider(format!(
                        "failed to make request after {} attempts: {}",
                        attempt + 1,
                        e
                    ))
                    .into());
                }
            }
        }
    }
}

#[async_trait]
impl Provider for PerplexityProvider {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let owned;
        let request = if request.model.is_empty() {
            owned = ChatCompletionRequest {
                model: self.model.clone(),
                ..request.clone()
            };
            &owned
        } else {
            request
        };

        tracing::debug!(
            "Sending {} messages to {} (model {})",
            request.messages.len(),
            self.endpoint,
            request.model
        );

        let response = self.send_with_retries(request).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Perplexity returned error {}: {}", status, error_text);
            return Err(PplxError::Provider(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                error_text
            ))
            .into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Perplexity response: {}", e);
            PplxError::Provider(format!("Failed to parse response: {}", e))
        })?;

        tracing::debug!(
            "Received {} choices, {} search results, {} total tokens",
            body.choices.len(),
            body.search_results.len(),
            body.usage.total_tokens
        );
        Ok(body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
