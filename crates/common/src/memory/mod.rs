//! Conversation memory
//!
//! One `ConversationState` per session, owned exclusively by the engine.
//! Turns are append-only and keep chronological insertion order; the
//! buffer is cleared only on explicit reset.

use serde::{Deserialize, Serialize};

/// Who authored a message in a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Assistant,
}

/// One message in the conversation buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Ordered, append-only conversation buffer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed turn (human message, assistant answer)
    pub fn append(&mut self, human: &str, assistant: &str) {
        self.messages.push(Message {
            role: Role::Human,
            content: human.to_string(),
        });
        self.messages.push(Message {
            role: Role::Assistant,
            content: assistant.to_string(),
        });
    }

    /// All messages in insertion order
    pub fn list(&self) -> &[Message] {
        &self.messages
    }

    /// Whether any turn has been recorded
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages recorded
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Clear the buffer (explicit reset only)
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
