//! Answer and suggestion providers.
//!
//! Both providers are capability interfaces: the service only knows the trait
//! objects, so tests and deployments can swap backends freely.
//! - [`CannedAnswerProvider`]: fixed advice template, no network
//! - [`OllamaAnswerProvider`]: generation through an Ollama server
//! - [`StaticSuggestionProvider`]: random sample from a configured pool

pub mod canned;
pub mod error;
pub mod ollama;
pub mod suggestions;

pub use canned::CannedAnswerProvider;
pub use error::{ProviderError, ProviderResult};
pub use ollama::OllamaAnswerProvider;
pub use suggestions::StaticSuggestionProvider;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{AnswerBackend, AnswerConfig};

/// Boxed future type for provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An answer with the provider's confidence in it.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    text: String,
    confidence: f64,
}

impl Answer {
    /// Build an answer, checking that `confidence` is a probability.
    ///
    /// # Errors
    /// Returns [`ProviderError::InvalidConfidence`] if `confidence` is outside `[0, 1]` or NaN.
    pub fn new(text: impl Into<String>, confidence: f64) -> ProviderResult<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ProviderError::InvalidConfidence(confidence));
        }
        Ok(Self {
            text: text.into(),
            confidence,
        })
    }

    /// Answer text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Confidence in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Split into text and confidence.
    #[must_use]
    pub fn into_parts(self) -> (String, f64) {
        (self.text, self.confidence)
    }
}

/// Maps a question to an answer.
pub trait AnswerProvider: Send + Sync {
    /// Answer `question`.
    fn answer<'a>(&'a self, question: &'a str) -> ProviderFuture<'a, ProviderResult<Answer>>;
}

/// Supplies suggested follow-up questions.
pub trait SuggestionProvider: Send + Sync {
    /// Return an ordered list of suggested questions.
    fn suggestions(&self) -> ProviderFuture<'_, ProviderResult<Vec<String>>>;
}

/// Build the answer provider selected by `config`.
///
/// # Errors
/// Returns an error if the HTTP client for a remote backend cannot be built.
pub fn answer_provider_from_config(
    config: &AnswerConfig,
) -> ProviderResult<Arc<dyn AnswerProvider>> {
    let provider: Arc<dyn AnswerProvider> = match config.backend {
        AnswerBackend::Canned => Arc::new(CannedAnswerProvider::new(config.canned_confidence)),
        AnswerBackend::Ollama => Arc::new(OllamaAnswerProvider::new(config.ollama.clone())?),
    };
    Ok(provider)
}
