//! Types for conversation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SessionId, TurnId};

/// Topic shown for a conversation without any turn yet.
pub const DEFAULT_TOPIC: &str = "New conversation";

/// Maximum length, in characters, of a topic derived from a message.
pub const TOPIC_MAX_CHARS: usize = 60;

/// Lowest accepted feedback rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted feedback rating.
pub const MAX_RATING: u8 = 5;

/// One user message and the answer produced for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Identifier handed back to the client for feedback.
    pub id: TurnId,
    /// Text sent by the user.
    pub message: String,
    /// Answer returned to the user.
    pub response: String,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Build a turn stamped with the current time.
    #[must_use]
    pub fn new(message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            message: message.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }
}

/// A conversation owned by the store.
#[derive(Clone, Debug)]
pub struct Conversation {
    /// Session key.
    pub id: SessionId,
    /// Language tag supplied when the conversation was started.
    pub language: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Append-only turn sequence.
    turns: Vec<Turn>,
    /// Ratings left on turns, one per turn.
    feedback: Vec<Feedback>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new(id: SessionId, language: impl Into<String>) -> Self {
        Self {
            id,
            language: language.into(),
            created_at: Utc::now(),
            turns: Vec::new(),
            feedback: Vec::new(),
        }
    }

    /// Append a turn at the end of the sequence.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Record a rating for one of this conversation's turns.
    ///
    /// A newer rating replaces the previous one for the same turn. Returns
    /// `false`, recording nothing, when no turn has that id.
    pub fn record_feedback(&mut self, feedback: Feedback) -> bool {
        if !self.turns.iter().any(|t| t.id == feedback.turn_id) {
            return false;
        }
        self.feedback.retain(|f| f.turn_id != feedback.turn_id);
        self.feedback.push(feedback);
        true
    }

    /// Ratings in the order they were last recorded.
    #[must_use]
    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    /// Turns in insertion order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Timestamp of the latest activity (last turn, or creation).
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.turns.last().map_or(self.created_at, |t| t.created_at)
    }

    /// Build the listing entry for this conversation.
    #[must_use]
    pub fn summary(&self) -> ConversationSummary {
        let topic = self
            .turns
            .first()
            .map_or_else(|| DEFAULT_TOPIC.to_string(), |t| truncate_topic(&t.message));
        let last_message = self
            .turns
            .last()
            .map_or_else(String::new, |t| t.message.clone());

        ConversationSummary {
            session_id: self.id,
            language: self.language.clone(),
            topic,
            last_message,
            last_activity: self.last_activity(),
            turn_count: self.turns.len(),
        }
    }
}

/// Listing entry for a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Session key.
    pub session_id: SessionId,
    /// Language tag supplied when the conversation was started.
    pub language: String,
    /// First user message, shortened.
    pub topic: String,
    /// Most recent user message, empty when there is none.
    pub last_message: String,
    /// Timestamp of the latest activity.
    pub last_activity: DateTime<Utc>,
    /// Number of recorded turns.
    pub turn_count: usize,
}

/// A user's rating of one answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Rated turn.
    pub turn_id: TurnId,
    /// Rating between [`MIN_RATING`] and [`MAX_RATING`].
    pub rating: u8,
    /// When the rating was recorded.
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Build a rating stamped with the current time.
    #[must_use]
    pub fn new(turn_id: TurnId, rating: u8) -> Self {
        Self {
            turn_id,
            rating,
            created_at: Utc::now(),
        }
    }

    /// Whether `rating` lies in the accepted range.
    #[must_use]
    pub fn is_valid_rating(rating: u8) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&rating)
    }
}

fn truncate_topic(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() <= TOPIC_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut topic: String = trimmed.chars().take(TOPIC_MAX_CHARS - 1).collect();
    topic.push('…');
    topic
}
