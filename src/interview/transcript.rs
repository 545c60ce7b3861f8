use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::ai_gateway::types::{ChatMessage, ChatRole};

/// Role-tagged conversation history sent to the oracle.
///
/// Index 0 always holds the system prompt. Everything after it is
/// append-only, except for scoped messages which live for exactly one
/// oracle call and are removed when their guard drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Drops messages past `len`. The system prompt is never removed.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    /// Appends a message that is removed again when the guard drops.
    pub fn scoped_push(&mut self, message: ChatMessage) -> ScopedMessage<'_> {
        let index = self.messages.len();
        self.scoped_insert(index, message)
    }

    /// Inserts a message that is removed again when the guard drops.
    ///
    /// The index is clamped to `1..=len` so the system prompt keeps position 0.
    pub fn scoped_insert(&mut self, index: usize, message: ChatMessage) -> ScopedMessage<'_> {
        let index = index.clamp(1, self.messages.len());
        self.messages.insert(index, message.clone());
        ScopedMessage {
            transcript: self,
            index,
            message,
        }
    }

    fn remove_scoped(&mut self, index: usize, message: &ChatMessage) {
        if self.messages.get(index) == Some(message) {
            self.messages.remove(index);
            return;
        }

        // A nested guard was mishandled; fall back to the most recent copy.
        if let Some(position) = self
            .messages
            .iter()
            .rposition(|candidate| candidate == message)
            .filter(|position| *position > 0)
        {
            tracing::warn!(
                target: "interview",
                expected_index = index,
                found_index = position,
                "scoped_message_moved"
            );
            self.messages.remove(position);
        }
    }
}

/// Guard for a temporary transcript entry.
///
/// Dropping it removes the entry, which also covers error returns and a
/// cancelled future awaiting an oracle call.
pub struct ScopedMessage<'a> {
    transcript: &'a mut Transcript,
    index: usize,
    message: ChatMessage,
}

impl ScopedMessage<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> ChatRole {
        self.message.role
    }
}

impl Deref for ScopedMessage<'_> {
    type Target = Transcript;

    fn deref(&self) -> &Self::Target {
        self.transcript
    }
}

impl DerefMut for ScopedMessage<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.transcript
    }
}

impl Drop for ScopedMessage<'_> {
    fn drop(&mut self) {
        self.transcript.remove_scoped(self.index, &self.message);
    }
}
