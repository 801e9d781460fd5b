/// Default settings for the Anthropic messages client.
#[derive(Debug, Clone, Copy)]
pub struct AnthropicDefaults {
    pub endpoint: &'static str,
    pub model: &'static str,
    pub api_version: &'static str,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Shared defaults so CLI, service, and tests stay in sync.
pub const ANTHROPIC_DEFAULTS: AnthropicDefaults = AnthropicDefaults {
    endpoint: "https://api.anthropic.com/v1/messages",
    model: "claude-3-5-sonnet-20241022",
    api_version: "2023-06-01",
    temperature: 0.1,
    timeout_secs: 60,
    max_attempts: 3,
};

/// Configuration for an [`AnthropicClient`](crate::AnthropicClient).
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Attempts per request, counting the first one.
    pub max_attempts: u32,
}

/// Convenience helper to build an [`AnthropicConfig`] from the shared defaults.
pub fn default_config(api_key: impl Into<String>) -> AnthropicConfig {
    AnthropicConfig {
        endpoint: ANTHROPIC_DEFAULTS.endpoint.into(),
        api_key: api_key.into(),
        model: ANTHROPIC_DEFAULTS.model.into(),
        temperature: ANTHROPIC_DEFAULTS.temperature,
        timeout_secs: ANTHROPIC_DEFAULTS.timeout_secs,
        max_attempts: ANTHROPIC_DEFAULTS.max_attempts,
    }
}
