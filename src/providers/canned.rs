//! Offline answer provider.

use super::{Answer, AnswerProvider, ProviderFuture, ProviderResult};

/// Prefix prepended to every canned answer.
const ADVICE_PREFIX: &str = "🌾 AI Advice: ";

/// Answers every question with a fixed advice template.
#[derive(Clone, Debug)]
pub struct CannedAnswerProvider {
    confidence: f64,
}

impl CannedAnswerProvider {
    /// Create a provider reporting `confidence` for every answer.
    #[must_use]
    pub const fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

impl AnswerProvider for CannedAnswerProvider {
    fn answer<'a>(&'a self, question: &'a str) -> ProviderFuture<'a, ProviderResult<Answer>> {
        Box::pin(async move { Answer::new(format!("{ADVICE_PREFIX}{question}"), self.confidence) })
    }
}
