//! Conversation storage contract and the in-memory backend.

use std::future::Future;
use std::pin::Pin;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::ids::SessionId;

use super::error::{StoreError, StoreResult};
use super::types::{Conversation, ConversationSummary, Feedback, Turn};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Keyed conversation storage.
///
/// The store is the only component allowed to mutate conversations. Turn
/// sequences are append-only: implementations must never reorder or rewrite
/// a turn once it has been added.
pub trait ConversationStore: Send + Sync {
    /// Insert an empty conversation keyed by `id`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] rather than overwriting.
    fn create(&self, id: SessionId, language: &str) -> StoreFuture<'_, StoreResult<()>>;

    /// Check whether a live conversation is keyed by `id`.
    fn exists(&self, id: SessionId) -> StoreFuture<'_, StoreResult<bool>>;

    /// Append a turn to the conversation keyed by `id`.
    ///
    /// Fails with [`StoreError::NotFound`] when the session is absent; a
    /// missing session is never created implicitly.
    fn add_message(&self, id: SessionId, turn: Turn) -> StoreFuture<'_, StoreResult<()>>;

    /// Return the turns of the conversation keyed by `id`, oldest first.
    fn get(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Vec<Turn>>>;

    /// Record a rating for one turn of the conversation keyed by `id`.
    ///
    /// The turn itself is left untouched. Fails with [`StoreError::NotFound`]
    /// for an unknown session and [`StoreError::TurnNotFound`] for an unknown
    /// turn.
    fn rate(&self, id: SessionId, feedback: Feedback) -> StoreFuture<'_, StoreResult<()>>;

    /// Return the ratings recorded in the conversation keyed by `id`.
    fn feedback(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Vec<Feedback>>>;

    /// Remove the conversation keyed by `id`.
    ///
    /// Deleting an absent session fails with [`StoreError::NotFound`].
    fn delete(&self, id: SessionId) -> StoreFuture<'_, StoreResult<()>>;

    /// List every live conversation, most recently active first.
    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>>;
}

/// Process-local store backed by a concurrent map.
///
/// State lives only as long as the process; nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<SessionId, Conversation>,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn create(&self, id: SessionId, language: &str) -> StoreFuture<'_, StoreResult<()>> {
        let language = language.to_string();
        Box::pin(async move {
            let entry = self.conversations.entry(id);
            match entry {
                Entry::Occupied(_) => Err(StoreError::AlreadyExists(id)),
                Entry::Vacant(slot) => {
                    slot.insert(Conversation::new(id, language));
                    Ok(())
                }
            }
        })
    }

    fn exists(&self, id: SessionId) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move { Ok(self.conversations.contains_key(&id)) })
    }

    fn add_message(&self, id: SessionId, turn: Turn) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.conversations
                .get_mut(&id)
                .map(|mut conversation| conversation.push(turn))
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn get(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Vec<Turn>>> {
        Box::pin(async move {
            self.conversations
                .get(&id)
                .map(|conversation| conversation.turns().to_vec())
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn rate(&self, id: SessionId, feedback: Feedback) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let turn = feedback.turn_id;
            let recorded = self
                .conversations
                .get_mut(&id)
                .map(|mut conversation| conversation.record_feedback(feedback))
                .ok_or(StoreError::NotFound(id))?;
            recorded
                .then_some(())
                .ok_or(StoreError::TurnNotFound { session: id, turn })
        })
    }

    fn feedback(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Vec<Feedback>>> {
        Box::pin(async move {
            self.conversations
                .get(&id)
                .map(|conversation| conversation.feedback().to_vec())
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn delete(&self, id: SessionId) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.conversations
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>> {
        Box::pin(async move {
            let mut summaries: Vec<ConversationSummary> = self
                .conversations
                .iter()
                .map(|entry| entry.value().summary())
                .collect();
            summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
            Ok(summaries)
        })
    }
}
