//! Error types for the conversation store.

use thiserror::Error;

use crate::ids::{SessionId, TurnId};

/// Conversation store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live conversation is keyed by this session.
    #[error("conversation not found: {0}")]
    NotFound(SessionId),
    /// The session exists but holds no turn with this id.
    #[error("turn {turn} not found in conversation {session}")]
    TurnNotFound {
        /// Session that was searched.
        session: SessionId,
        /// Turn that was requested.
        turn: TurnId,
    },
    /// A conversation is already keyed by this session.
    #[error("conversation already exists: {0}")]
    AlreadyExists(SessionId),
    /// Backing storage could not serve the request.
    #[error("conversation store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
