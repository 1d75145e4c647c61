//! Wire-level shapes for each supported AI provider

use crate::error::RecipeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SYSTEM_PROMPT: &str =
    "You are an experienced chef AI that generates personalized recipes as JSON.";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Supported providers. Adding one means adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Ollama,
    Local, // OpenAI-compatible server on localhost, no auth
}

/// Connection settings for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// OpenAI-style chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Anthropic messages request
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama generate request
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

/// Request body for any provider
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProviderRequest {
    Chat(ChatCompletionRequest),
    Messages(MessagesRequest),
    Generate(GenerateRequest),
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Ollama,
        Provider::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
            Provider::Local => "local",
        }
    }

    pub fn default_config(&self) -> ProviderConfig {
        let (base_url, model) = match self {
            Provider::OpenAi => ("https://api.openai.com", "gpt-4"),
            Provider::Anthropic => ("https://api.anthropic.com", "claude-3-sonnet-20240229"),
            Provider::Ollama => ("http://localhost:11434", "llama2"),
            Provider::Local => ("http://localhost:8080", "local-model"),
        };
        ProviderConfig {
            base_url: base_url.to_string(),
            model: model.to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    /// HTTP path appended to the base URL
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Provider::OpenAi | Provider::Local => "/v1/chat/completions",
            Provider::Anthropic => "/v1/messages",
            Provider::Ollama => "/api/generate",
        }
    }

    pub fn endpoint_url(&self, config: &ProviderConfig) -> String {
        format!("{}{}", config.base_url.trim_end_matches('/'), self.endpoint_path())
    }

    /// Whether requests are rejected without a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::OpenAi | Provider::Anthropic)
    }

    pub fn build_request(&self, prompt: &str, config: &ProviderConfig) -> ProviderRequest {
        match self {
            Provider::OpenAi | Provider::Local => ProviderRequest::Chat(ChatCompletionRequest {
                model: config.model.clone(),
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT.to_string(),
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt.to_string(),
                    },
                ],
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                // Local servers vary in JSON-mode support
                response_format: (*self == Provider::OpenAi).then_some(ResponseFormat {
                    format_type: "json_object",
                }),
            }),
            Provider::Anthropic => ProviderRequest::Messages(MessagesRequest {
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                }],
                temperature: config.temperature,
            }),
            Provider::Ollama => ProviderRequest::Generate(GenerateRequest {
                model: config.model.clone(),
                prompt: prompt.to_string(),
                stream: false,
                options: GenerateOptions {
                    temperature: config.temperature,
                    num_predict: config.max_tokens,
                },
            }),
        }
    }

    /// Authentication headers. Omitted entirely when no key is supplied.
    pub fn auth_headers(&self, api_key: Option<&str>) -> Vec<(&'static str, String)> {
        match (self, api_key) {
            (Provider::OpenAi, Some(key)) => vec![("authorization", format!("Bearer {}", key))],
            (Provider::Anthropic, Some(key)) => vec![
                ("x-api-key", key.to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            (Provider::Anthropic, None) => {
                vec![("anthropic-version", ANTHROPIC_VERSION.to_string())]
            }
            _ => vec![],
        }
    }

    /// Pull the generated text out of a raw response body
    pub fn extract_content(&self, body: &str) -> Result<String, RecipeError> {
        let malformed = |e: serde_json::Error| {
            RecipeError::response(None, format!("malformed {} envelope: {}", self, e))
        };

        match self {
            Provider::OpenAi | Provider::Local => {
                let resp: ChatCompletionResponse = serde_json::from_str(body).map_err(malformed)?;
                resp.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| RecipeError::response(None, "no message content in choices"))
            }
            Provider::Anthropic => {
                let resp: MessagesResponse = serde_json::from_str(body).map_err(malformed)?;
                resp.content
                    .into_iter()
                    .find_map(|block| (block.block_type == "text").then_some(block.text).flatten())
                    .ok_or_else(|| RecipeError::response(None, "no text block in content"))
            }
            Provider::Ollama => {
                let resp: GenerateResponse = serde_json::from_str(body).map_err(malformed)?;
                Ok(resp.response)
            }
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| RecipeError::UnknownProvider(s.to_string()))
    }
}
