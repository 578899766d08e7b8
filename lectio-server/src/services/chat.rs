//! Chat relay to a language-model provider
//!
//! One outbound call per request, no retry. The prompt template is chosen by
//! [`ChatKind`]; the system prompt is fixed.

use async_trait::async_trait;
use lectio_common::api::ChatKind;
use lectio_common::config::ChatConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("lectio-server/", env!("CARGO_PKG_VERSION"));
const SYSTEM_PROMPT: &str = "You are an AI that provides responses based on biblical texts.";
const EMPTY_REPLY: &str = "No response";

/// Chat provider errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No API key configured (set {0})")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned {0}: {1}")]
    Upstream(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Prompt is empty")]
    EmptyPrompt,
}

/// Language-model completion seam
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, kind: ChatKind, user_prompt: &str) -> Result<String, ChatError>;
}

/// Wrap the user's words in the template for `kind`
pub fn build_prompt(kind: ChatKind, user_prompt: &str) -> String {
    match kind {
        ChatKind::Biblical => format!(
            "Explain the following words in their biblical context, drawing on the surrounding \
             passage and the wider scriptures: {}",
            user_prompt
        ),
        ChatKind::Life => format!(
            "Explain how the following words from the Bible apply to everyday modern life, \
             with practical examples: {}",
            user_prompt
        ),
        ChatKind::General => format!(
            "Provide a Bible-based response to the following: {}. If the user asks you to \
             explain a verse please explain that verse that it is provided to you in more detail.",
            user_prompt
        ),
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiChatProvider {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiChatProvider {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn complete(&self, kind: ChatKind, user_prompt: &str) -> Result<String, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::MissingApiKey(self.api_key_env.clone()))?;

        let prompt = build_prompt(kind, user_prompt);
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, kind = ?kind, "Querying chat provider");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream(status.as_u16(), body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}

/// Relay one chat request through `provider`
pub async fn relay(
    provider: &dyn ChatProvider,
    kind: ChatKind,
    user_prompt: &str,
) -> Result<String, ChatError> {
    let user_prompt = user_prompt.trim();
    if user_prompt.is_empty() {
        return Err(ChatError::EmptyPrompt);
    }
    provider.complete(kind, user_prompt).await
}
