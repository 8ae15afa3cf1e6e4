//! Configuration for the assistant service.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Welcome message returned by `start`.
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm your AI farming assistant. How can I help you?";

/// Intent label attached to every answer.
pub const DEFAULT_INTENT: &str = "farming_advice";

/// Environment variable prefix.
const ENV_PREFIX: &str = "WIKIKISAN_";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or otherwise unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    Env {
        /// Variable name.
        var: String,
        /// Raw value found.
        value: String,
    },
    /// A URL setting does not parse.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Which answer provider backs the `message` endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerBackend {
    /// Fixed advice template, no external calls.
    #[default]
    Canned,
    /// Local or remote Ollama server.
    Ollama,
}

impl FromStr for AnswerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canned" => Ok(Self::Canned),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown answer backend: {other}")),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Message returned when a conversation starts.
    pub welcome_message: String,
    /// Intent label attached to answers.
    pub intent: String,
    /// Answer provider settings.
    pub answers: AnswerConfig,
    /// Suggested-question settings.
    pub suggestions: SuggestionConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            intent: DEFAULT_INTENT.to_string(),
            answers: AnswerConfig::default(),
            suggestions: SuggestionConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the answer backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: AnswerBackend) -> Self {
        self.answers.backend = backend;
        self
    }

    /// Set the Ollama base URL.
    #[must_use]
    pub fn with_ollama_url(mut self, url: impl Into<String>) -> Self {
        self.answers.ollama.base_url = url.into();
        self
    }

    /// Set how many suggestions are returned per call.
    #[must_use]
    pub const fn with_suggestion_count(mut self, count: usize) -> Self {
        self.suggestions.count = count;
        self
    }

    /// Load configuration from `WIKIKISAN_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable does not parse or the result fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Keys are the suffixes after `WIKIKISAN_` (for example `PORT`).
    ///
    /// # Errors
    /// Returns an error if a value does not parse or the result fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = move |suffix: &str| {
            let var = format!("{ENV_PREFIX}{suffix}");
            lookup(var.as_str()).map(|value| (var, value))
        };

        let mut config = Self::default();

        if let Some((var, value)) = get("PORT") {
            config.port = parse_var(&var, &value)?;
        }
        if let Some((var, value)) = get("ANSWER_BACKEND") {
            config.answers.backend = parse_var(&var, &value)?;
        }
        if let Some((_, value)) = get("OLLAMA_URL") {
            config.answers.ollama.base_url = value;
        }
        if let Some((_, value)) = get("MODEL") {
            config.answers.ollama.model = value;
        }
        if let Some((var, value)) = get("SUGGESTION_COUNT") {
            config.suggestions.count = parse_var(&var, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }
        if self.welcome_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "welcome_message must not be empty".to_string(),
            ));
        }
        if self.intent.trim().is_empty() {
            return Err(ConfigError::Invalid("intent must not be empty".to_string()));
        }
        if self.suggestions.count == 0 {
            return Err(ConfigError::Invalid(
                "suggestions.count must be > 0".to_string(),
            ));
        }
        if self.suggestions.count > self.suggestions.pool.len() {
            return Err(ConfigError::Invalid(format!(
                "suggestions.count ({}) exceeds pool size ({})",
                self.suggestions.count,
                self.suggestions.pool.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.answers.canned_confidence) {
            return Err(ConfigError::Invalid(
                "answers.canned_confidence must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.answers.ollama.default_confidence) {
            return Err(ConfigError::Invalid(
                "answers.ollama.default_confidence must be within [0, 1]".to_string(),
            ));
        }
        if self.answers.ollama.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "answers.ollama.model must not be empty".to_string(),
            ));
        }

        Url::parse(&self.answers.ollama.base_url)?;

        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Answer provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Selected backend.
    pub backend: AnswerBackend,
    /// Confidence reported by the canned backend.
    pub canned_confidence: f64,
    /// Ollama backend settings.
    pub ollama: OllamaConfig,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            backend: AnswerBackend::default(),
            canned_confidence: 0.85,
            ollama: OllamaConfig::default(),
        }
    }
}

/// Ollama backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Model name as installed in Ollama.
    pub model: String,
    /// How long Ollama keeps the model resident after a call.
    pub keep_alive: String,
    /// Token budget per answer.
    pub num_predict: u32,
    /// Confidence used when the model omits one.
    pub default_confidence: f64,
    /// Whole-request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "mistral:7b-instruct-q8_0".to_string(),
            keep_alive: "5m".to_string(),
            num_predict: 512,
            default_confidence: 0.5,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Suggested-question settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Questions to sample from.
    pub pool: Vec<String>,
    /// Questions returned per call.
    pub count: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            pool: default_suggestion_pool(),
            count: 3,
        }
    }
}

fn default_suggestion_pool() -> Vec<String> {
    [
        "How to increase crop yield?",
        "Best fertilizer for rice?",
        "How to control pests naturally?",
        "What is drip irrigation?",
        "Best season for wheat?",
        "When to sow wheat?",
        "How to test soil health?",
        "Which crops suit sandy soil?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.welcome_message, DEFAULT_WELCOME_MESSAGE);
        assert_eq!(config.intent, DEFAULT_INTENT);
        assert_eq!(config.answers.backend, AnswerBackend::Canned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AssistantConfig::new()
            .with_port(8080)
            .with_backend(AnswerBackend::Ollama)
            .with_ollama_url("http://10.0.0.2:11434")
            .with_suggestion_count(2);

        assert_eq!(config.port, 8080);
        assert_eq!(config.answers.backend, AnswerBackend::Ollama);
        assert_eq!(config.answers.ollama.base_url, "http://10.0.0.2:11434");
        assert_eq!(config.suggestions.count, 2);
    }

    #[test]
    fn test_from_lookup_reads_prefixed_vars() {
        let config = AssistantConfig::from_lookup(lookup_from(&[
            ("WIKIKISAN_PORT", "4000"),
            ("WIKIKISAN_ANSWER_BACKEND", "Ollama"),
            ("WIKIKISAN_MODEL", "llama3"),
            ("WIKIKISAN_SUGGESTION_COUNT", "2"),
        ]))
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.answers.backend, AnswerBackend::Ollama);
        assert_eq!(config.answers.ollama.model, "llama3");
        assert_eq!(config.suggestions.count, 2);
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let err = AssistantConfig::from_lookup(lookup_from(&[("WIKIKISAN_PORT", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref var, .. } if var == "WIKIKISAN_PORT"));
    }

    #[test]
    fn test_from_lookup_rejects_bad_url() {
        let err =
            AssistantConfig::from_lookup(lookup_from(&[("WIKIKISAN_OLLAMA_URL", "not a url")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }

    #[test]
    fn test_validate_suggestion_count_bounds() {
        let too_many = AssistantConfig::new().with_suggestion_count(100);
        assert!(matches!(too_many.validate(), Err(ConfigError::Invalid(_))));

        let zero = AssistantConfig::new().with_suggestion_count(0);
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_confidence_range() {
        let mut config = AssistantConfig::default();
        config.answers.canned_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("canned".parse::<AnswerBackend>(), Ok(AnswerBackend::Canned));
        assert_eq!(" OLLAMA ".parse::<AnswerBackend>(), Ok(AnswerBackend::Ollama));
        assert!("openai".parse::<AnswerBackend>().is_err());
    }
}
