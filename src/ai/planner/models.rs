//! The models for a planning conversation.
use crate::openai::{Message, Role};

/// `Create` while waiting for a plan, `Specify` while a proposal is
/// waiting to be confirmed, refined, or thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Create,
    Specify,
}

/// What the user should see, in order. Assistant replies arrive as a
/// start marker, any number of deltas, and an end marker.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    AssistantStart,
    AssistantDelta(String),
    AssistantEnd,
    System(String),
}

/// Messages exchanged with the model. The system prompt isn't stored
/// here, it's put in front when a request is made.
#[derive(Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0.clone()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.0.iter().rev().find(|m| m.role() == Role::Assistant)
    }
}
