//! OpenAI-compatible turn processor.
//!
//! Sends the assembled conversation plus the user's input to a chat
//! completions endpoint (`POST {base_url}/chat/completions`, non-streaming)
//! and returns the single assistant message.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use parley_core::thread::ThreadHistory;
use parley_core::turn::TurnProcessor;
use parley_types::error::TurnError;
use parley_types::message::Message;

/// Configuration for [`ChatTurnProcessor`].
pub struct ChatTurnProcessorConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    /// Model identifier (e.g., "gpt-4o").
    pub model: String,
    /// API key; optional for local endpoints that skip authentication.
    pub api_key: Option<SecretString>,
    /// System instruction prepended to every request.
    pub system_prompt: String,
    /// Upper bound for one completion request.
    pub request_timeout: Duration,
}

impl ChatTurnProcessorConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            system_prompt: "You are a helpful assistant. Answer the user's \
                            questions using the conversation so far."
                .to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

/// Turn processor backed by an OpenAI-compatible chat completions API.
pub struct ChatTurnProcessor {
    client: reqwest::Client,
    config: ChatTurnProcessorConfig,
}

impl ChatTurnProcessor {
    pub fn new(config: ChatTurnProcessorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Replay the conversational history as wire messages, with the system
    /// instruction first and the new user input last.
    fn build_request(&self, history: &ThreadHistory, input: &str) -> CompletionsRequest {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: self.config.system_prompt.clone(),
        }];

        for (role, content) in history.transcript() {
            messages.push(WireMessage {
                role: role.to_string(),
                content,
            });
        }

        messages.push(WireMessage {
            role: "user".to_string(),
            content: input.to_string(),
        });

        CompletionsRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
        }
    }
}

impl TurnProcessor for ChatTurnProcessor {
    async fn respond(&self, history: &ThreadHistory, input: &str) -> Result<Message, TurnError> {
        let request = self.build_request(history, input);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "requesting completion"
        );

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| TurnError::Provider {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TurnError::Provider {
                message: format!("completion request failed with {status}: {body}"),
            });
        }

        let completion: CompletionsResponse = response
            .json()
            .await
            .map_err(|e| TurnError::Decode(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(TurnError::Empty);
        }

        Ok(Message::assistant(content))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionsRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionsChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    message: CompletionsMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionsMessage {
    content: Option<String>,
}
