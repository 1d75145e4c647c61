//! HTTP client that sends a prompt to an AI provider

use crate::backends::CompletionBackend;
use crate::error::RecipeError;
use crate::provider::{Provider, ProviderConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// One request/response exchange per call, with a request deadline and a
/// bounded retry on transport failures only.
pub struct RecipeClient {
    client: reqwest::Client,
    overrides: HashMap<Provider, ProviderConfig>,
    transport_retries: u32,
}

impl RecipeClient {
    pub fn new(timeout: Duration) -> Result<Self, RecipeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecipeError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            overrides: HashMap::new(),
            transport_retries: 1,
        })
    }

    /// Replace the default settings for one provider
    pub fn with_provider_config(mut self, provider: Provider, config: ProviderConfig) -> Self {
        self.overrides.insert(provider, config);
        self
    }

    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    pub fn config_for(&self, provider: Provider) -> ProviderConfig {
        self.overrides
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| provider.default_config())
    }

    async fn send_once(
        &self,
        url: &str,
        provider: Provider,
        body: &crate::provider::ProviderRequest,
        api_key: Option<&str>,
    ) -> Result<String, RecipeError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in provider.auth_headers(api_key) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let mut message = text;
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(RecipeError::response(Some(status.as_u16()), message));
        }

        provider.extract_content(&text)
    }
}

#[async_trait]
impl CompletionBackend for RecipeClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn complete(
        &self,
        prompt: &str,
        provider: Provider,
        api_key: Option<&str>,
    ) -> Result<String, RecipeError> {
        let config = self.config_for(provider);
        let url = provider.endpoint_url(&config);
        let body = provider.build_request(prompt, &config);

        if provider.requires_api_key() && api_key.is_none() {
            warn!("No API key configured for provider {}", provider);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("POST {} (model={}, attempt {})", url, config.model, attempt);

            match self.send_once(&url, provider, &body, api_key).await {
                Ok(content) => {
                    info!("{} returned {} chars of content", provider, content.len());
                    return Ok(content);
                }
                Err(RecipeError::Transport(msg)) if attempt <= self.transport_retries => {
                    warn!("Transport failure calling {}: {}. Retrying.", provider, msg);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
