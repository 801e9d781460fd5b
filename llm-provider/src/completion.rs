use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AnthropicConfig, ANTHROPIC_DEFAULTS};

/// Errors that can be produced by completion requests.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("invalid completion configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed completion response: {message}")]
    MalformedResponse { message: String },
}

/// Core interface to the text-completion collaborator. One prompt in, raw
/// completion text out; transport and rate-limit failures surface as errors.
pub trait TextCompletion: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Blocking client for the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicClient {
    agent: ureq::Agent,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::InvalidConfiguration {
                message: "api_key must not be empty".into(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(CompletionError::InvalidConfiguration {
                message: "model must not be empty".into(),
            });
        }
        if config.max_attempts == 0 {
            return Err(CompletionError::InvalidConfiguration {
                message: "max_attempts must be at least 1".into(),
            });
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Ok(Self { agent, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn do_request(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("x-api-key", &self.config.api_key)
            .set("anthropic-version", ANTHROPIC_DEFAULTS.api_version)
            .set("content-type", "application/json")
            .send_json(&request)
            .map_err(map_ureq_error)?;

        let parsed: MessagesResponse = response
            .into_json()
            .map_err(|err| CompletionError::MalformedResponse { message: err.to_string() })?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| CompletionError::MalformedResponse {
                message: "response carried no content blocks".into(),
            })
    }
}

impl TextCompletion for AnthropicClient {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                warn!(
                    "completion retry ({}/{}) after {}ms",
                    attempt + 1,
                    self.config.max_attempts,
                    delay.as_millis()
                );
                std::thread::sleep(delay);
            }

            match self.do_request(prompt, max_tokens) {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if !is_retryable(&err) {
                        return Err(err);
                    }
                    warn!("completion attempt {} failed: {err}", attempt + 1);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or(CompletionError::Transport {
            message: "request attempts exhausted".into(),
        }))
    }
}

fn is_retryable(err: &CompletionError) -> bool {
    match err {
        CompletionError::Transport { .. } => true,
        CompletionError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn map_ureq_error(err: ureq::Error) -> CompletionError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response.into_string().unwrap_or_default();
            CompletionError::Api { status, message }
        }
        ureq::Error::Transport(transport) => {
            CompletionError::Transport { message: transport.to_string() }
        }
    }
}
