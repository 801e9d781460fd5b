use llm_provider::{default_config, AnthropicClient, CompletionError, ANTHROPIC_DEFAULTS};

#[test]
fn default_config_carries_shared_defaults() {
    let config = default_config("key-123");
    assert_eq!(config.endpoint, ANTHROPIC_DEFAULTS.endpoint);
    assert_eq!(config.model, ANTHROPIC_DEFAULTS.model);
    assert_eq!(config.max_attempts, ANTHROPIC_DEFAULTS.max_attempts);
    assert_eq!(config.api_key, "key-123");
}

#[test]
fn empty_api_key_is_rejected() {
    let config = default_config("  ");
    let err = AnthropicClient::new(config).expect_err("blank api key should fail");
    match err {
        CompletionError::InvalidConfiguration { message } => {
            assert!(message.contains("api_key"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_model_is_rejected() {
    let mut config = default_config("key-123");
    config.model = String::new();
    let err = AnthropicClient::new(config).expect_err("blank model should fail");
    match err {
        CompletionError::InvalidConfiguration { message } => {
            assert!(message.contains("model"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn zero_attempts_is_rejected() {
    let mut config = default_config("key-123");
    config.max_attempts = 0;
    assert!(AnthropicClient::new(config).is_err());
}

#[test]
fn valid_config_builds_a_client() {
    let client = AnthropicClient::new(default_config("key-123")).expect("valid configuration");
    assert_eq!(client.model(), ANTHROPIC_DEFAULTS.model);
}
