//! Conversation records and their keyed store.

pub mod error;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::{ConversationStore, InMemoryConversationStore, StoreFuture};
pub use types::{Conversation, ConversationSummary, Feedback, Turn};
