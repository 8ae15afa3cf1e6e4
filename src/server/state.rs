//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::conversation::{ConversationStore, InMemoryConversationStore};
use crate::providers::{
    self, AnswerProvider, ProviderResult, StaticSuggestionProvider, SuggestionProvider,
};
use crate::service::AssistantService;

/// Shared application state.
pub struct AppState {
    /// Conversation operations.
    pub service: AssistantService,
}

impl AppState {
    /// Wrap an already assembled service.
    #[must_use]
    pub fn new(service: AssistantService) -> Arc<Self> {
        Arc::new(Self { service })
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        store: Arc<dyn ConversationStore>,
        answers: Arc<dyn AnswerProvider>,
        suggestions: Arc<dyn SuggestionProvider>,
        config: &AssistantConfig,
    ) -> Arc<Self> {
        Self::new(AssistantService::new(store, answers, suggestions, config))
    }

    /// Build state from configuration with an empty in-memory store.
    ///
    /// # Errors
    /// Returns an error if the configured answer provider cannot be created.
    pub fn from_config(config: &AssistantConfig) -> ProviderResult<Arc<Self>> {
        let answers = providers::answer_provider_from_config(&config.answers)?;
        let suggestions = Arc::new(StaticSuggestionProvider::from_config(&config.suggestions));
        let store = Arc::new(InMemoryConversationStore::new());

        Ok(Self::with_parts(store, answers, suggestions, config))
    }
}
