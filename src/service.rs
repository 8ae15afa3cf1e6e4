//! Conversation operations behind the HTTP layer.
//!
//! [`AssistantService`] is the explicit context object handed to every
//! handler. It owns handles to the store and providers, so each test can
//! build a fresh, isolated instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AssistantConfig;
use crate::conversation::{ConversationStore, ConversationSummary, Feedback, StoreError, Turn};
use crate::ids::{SessionId, TurnId};
use crate::providers::{AnswerProvider, ProviderError, SuggestionProvider};

/// Status string returned after a deletion.
pub const DELETED_STATUS: &str = "deleted";

/// Status string returned after a rating is stored.
pub const RECORDED_STATUS: &str = "recorded";

/// Errors surfaced by service operations.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Store failure, including unknown sessions.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Answer or suggestion provider failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Feedback rating outside the accepted range.
    #[error("rating {0} is outside the accepted range")]
    InvalidRating(u8),
}

/// Convenience result alias for service operations.
pub type AssistantResult<T> = Result<T, AssistantError>;

/// Result of starting a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    /// Newly issued session.
    pub session_id: SessionId,
    /// Greeting shown to the user.
    pub welcome_message: String,
    /// Questions the user may ask next.
    pub suggested_questions: Vec<String>,
}

/// Result of sending a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    /// Recorded turn, used to rate the answer.
    pub message_id: TurnId,
    /// Answer text.
    pub response: String,
    /// Intent label.
    pub intent: String,
    /// Provider confidence, passed through unchanged.
    pub confidence: f64,
    /// Questions the user may ask next.
    pub suggested_questions: Vec<String>,
}

/// Result of deleting a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always [`DELETED_STATUS`].
    pub status: String,
}

/// Result of rating an answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    /// Always [`RECORDED_STATUS`].
    pub status: String,
}

/// Conversation operations shared by all request handlers.
pub struct AssistantService {
    store: Arc<dyn ConversationStore>,
    answers: Arc<dyn AnswerProvider>,
    suggestions: Arc<dyn SuggestionProvider>,
    welcome_message: String,
    intent: String,
}

impl AssistantService {
    /// Assemble a service from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConversationStore>,
        answers: Arc<dyn AnswerProvider>,
        suggestions: Arc<dyn SuggestionProvider>,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            store,
            answers,
            suggestions,
            welcome_message: config.welcome_message.clone(),
            intent: config.intent.clone(),
        }
    }

    /// Start a conversation under a fresh session.
    ///
    /// `language` is recorded with the conversation but does not change behaviour.
    ///
    /// # Errors
    /// Returns an error if the suggestion provider or the store fails. Nothing
    /// is stored when suggestions cannot be fetched.
    pub async fn start(&self, language: &str) -> AssistantResult<StartResponse> {
        let suggested_questions = self.suggestions.suggestions().await?;

        let session_id = SessionId::new();
        self.store.create(session_id, language).await?;
        tracing::info!(%session_id, language, "conversation started");

        Ok(StartResponse {
            session_id,
            welcome_message: self.welcome_message.clone(),
            suggested_questions,
        })
    }

    /// Answer `message` and record the turn in the session.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] for an unknown session (checked before
    /// the answer provider is called), or a provider error. A failed request
    /// records no turn.
    pub async fn message(
        &self,
        session_id: SessionId,
        message: &str,
    ) -> AssistantResult<MessageResponse> {
        if !self.store.exists(session_id).await? {
            return Err(StoreError::NotFound(session_id).into());
        }

        let (response, confidence) = self.answers.answer(message).await?.into_parts();
        let suggested_questions = self.suggestions.suggestions().await?;

        let turn = Turn::new(message, response.clone());
        let message_id = turn.id;
        self.store.add_message(session_id, turn).await?;
        tracing::debug!(%session_id, %message_id, confidence, "turn recorded");

        Ok(MessageResponse {
            message_id,
            response,
            intent: self.intent.clone(),
            confidence,
            suggested_questions,
        })
    }

    /// Return the turns of a session, oldest first.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] for an unknown session.
    pub async fn history(&self, session_id: SessionId) -> AssistantResult<Vec<Turn>> {
        Ok(self.store.get(session_id).await?)
    }

    /// Rate the answer recorded as `message_id` in a session.
    ///
    /// # Errors
    /// Returns [`AssistantError::InvalidRating`] when `rating` is out of range,
    /// [`StoreError::NotFound`] for an unknown session and
    /// [`StoreError::TurnNotFound`] for an unknown turn.
    pub async fn feedback(
        &self,
        session_id: SessionId,
        message_id: TurnId,
        rating: u8,
    ) -> AssistantResult<FeedbackResponse> {
        if !Feedback::is_valid_rating(rating) {
            return Err(AssistantError::InvalidRating(rating));
        }

        self.store
            .rate(session_id, Feedback::new(message_id, rating))
            .await?;
        tracing::info!(%session_id, %message_id, rating, "feedback recorded");

        Ok(FeedbackResponse {
            status: RECORDED_STATUS.to_string(),
        })
    }

    /// Delete a session.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the session does not exist (or was
    /// already deleted).
    pub async fn delete(&self, session_id: SessionId) -> AssistantResult<DeleteResponse> {
        self.store.delete(session_id).await?;
        tracing::info!(%session_id, "conversation deleted");
        Ok(DeleteResponse {
            status: DELETED_STATUS.to_string(),
        })
    }

    /// List live conversations, most recently active first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn conversations(&self) -> AssistantResult<Vec<ConversationSummary>> {
        Ok(self.store.list().await?)
    }
}
