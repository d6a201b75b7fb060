//! Prompt construction for chat generation

use pocket_core::{GenerateRequest, Message, Turn, TurnRole};

/// Builds chat requests from the system prompt plus a history window.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    max_history: usize,
}

impl PromptBuilder {
    /// Create a builder with the given system prompt and history window
    pub fn new(system_prompt: impl Into<String>, max_history: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_history,
        }
    }

    /// Build a request for the user's message with trailing history.
    ///
    /// Only the last `max_history` turns are included; system turns in the
    /// history are skipped since the builder supplies its own.
    pub fn build(&self, history: &[Turn], user_text: &str) -> GenerateRequest {
        let mut request = GenerateRequest::new(&self.system_prompt);

        let skip = history.len().saturating_sub(self.max_history);
        for turn in &history[skip..] {
            let message = match turn.role {
                TurnRole::User => Message::user(&turn.content),
                TurnRole::Assistant => Message::assistant(&turn.content),
                TurnRole::System => continue,
            };
            request = request.with_message(message);
        }

        request.with_user_message(user_text)
    }
}
