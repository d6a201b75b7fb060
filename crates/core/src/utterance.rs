//! Utterance and conversation turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single user submission, captured at the moment it enters the pipeline.
///
/// Immutable after creation; dropped once routing for it completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Raw text as typed or transcribed
    pub text: String,
    /// When the utterance was submitted
    pub timestamp: DateTime<Utc>,
    /// Conversation session this utterance belongs to
    pub session_id: String,
}

impl Utterance {
    /// Create an utterance stamped with the current time
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
        }
    }
}

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (instructions)
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Get word count
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let user = Turn::user("hello");
        let asst = Turn::assistant("hi there");

        assert_eq!(user.role, TurnRole::User);
        assert_eq!(asst.role, TurnRole::Assistant);
        assert_eq!(asst.word_count(), 2);
    }

    #[test]
    fn test_utterance_carries_session() {
        let u = Utterance::new("turn on the lights", "session-1");
        assert_eq!(u.session_id, "session-1");
        assert_eq!(u.text, "turn on the lights");
    }
}
