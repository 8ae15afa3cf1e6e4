//! Answer provider backed by an Ollama server.
//!
//! Behaviour:
//! - `POST {base_url}/api/generate`, non-streaming, with `format: "json"`.
//! - The model is asked to reply with `{"answer": ..., "confidence": ...}`.
//! - A missing confidence falls back to the configured default; an out-of-range
//!   one is rejected rather than clamped. Models often quote the number, so a
//!   numeric string is accepted too.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OllamaConfig;

use super::{Answer, AnswerProvider, ProviderError, ProviderFuture, ProviderResult};

/// Instructions prepended to every question.
const SYSTEM_PROMPT: &str = "You are an agricultural assistant helping farmers. \
Answer the farmer's question concisely and practically. \
Reply only with a JSON object of the form \
{\"answer\": \"<your answer>\", \"confidence\": <number between 0 and 1>}.";

/// Context window requested per call.
const CONTEXT_LENGTH: u32 = 8_192;

#[derive(Serialize)]
struct GenerateOptions {
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    keep_alive: &'a str,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Async Ollama client producing farming answers.
pub struct OllamaAnswerProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaAnswerProvider {
    /// Create a provider for the server described by `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    async fn generate(&self, question: &str) -> ProviderResult<Answer> {
        let prompt = format!("{SYSTEM_PROMPT}\n\nFarmer: {question}");
        let request = GenerateRequest {
            model: &self.config.model,
            prompt: &prompt,
            stream: false,
            format: "json",
            keep_alive: &self.config.keep_alive,
            options: GenerateOptions {
                num_ctx: CONTEXT_LENGTH,
                num_predict: self.config.num_predict,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: GenerateResponse = response.json().await?;
        let raw = body.response.ok_or_else(|| {
            ProviderError::MalformedResponse("missing `response` field".to_string())
        })?;

        parse_reply(&raw, self.config.default_confidence)
    }
}

impl AnswerProvider for OllamaAnswerProvider {
    fn answer<'a>(&'a self, question: &'a str) -> ProviderFuture<'a, ProviderResult<Answer>> {
        Box::pin(async move {
            tracing::debug!(model = %self.config.model, "requesting answer from ollama");
            self.generate(question).await
        })
    }
}

/// Interpret the model's raw output.
///
/// A JSON object is read field by field, so one badly typed field never turns
/// the whole object into answer text. Any other output is used verbatim as
/// the answer.
fn parse_reply(raw: &str, default_confidence: f64) -> ProviderResult<Answer> {
    let (text, confidence) = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => (
            fields
                .get("answer")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            read_confidence(fields.get("confidence"), default_confidence)?,
        ),
        Ok(Value::String(text)) => (text, default_confidence),
        Ok(_) | Err(_) => (raw.to_string(), default_confidence),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "model returned an empty answer".to_string(),
        ));
    }

    Answer::new(text, confidence)
}

/// Read `confidence` as a number or a numeric string.
fn read_confidence(value: Option<&Value>, default_confidence: f64) -> ProviderResult<f64> {
    match value {
        None | Some(Value::Null) => Ok(default_confidence),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| {
            ProviderError::MalformedResponse(format!("confidence {number} is not a float"))
        }),
        Some(Value::String(text)) => text.trim().parse::<f64>().map_err(|_| {
            ProviderError::MalformedResponse(format!("confidence {text:?} is not a number"))
        }),
        Some(other) => Err(ProviderError::MalformedResponse(format!(
            "confidence has unexpected type: {other}"
        ))),
    }
}
