//! Conversation history storage
//!
//! Stores the turns of one conversation with timestamps. Assistant turns
//! that produced recommendation cards keep those cards attached, so a UI
//! can redraw them later even after the intent moved on.

use crate::models::MatchedProgram;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Oldest turns are dropped beyond this many messages
pub const MAX_STORED_MESSAGES: usize = 200;

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
    /// Recommendation cards shown under this message
    #[serde(default)]
    pub show_cards: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<MatchedProgram>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
            show_cards: false,
            cards: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Assistant reply with the cards produced on the same turn
    pub fn assistant_with_cards(content: impl Into<String>, cards: Vec<MatchedProgram>) -> Self {
        let mut message = Self::assistant(content);
        message.show_cards = !cards.is_empty();
        message.cards = cards;
        message
    }
}

/// Conversation history for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: VecDeque<ConversationMessage>,
}

impl ConversationHistory {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: VecDeque::new(),
        }
    }

    pub fn add_message(&mut self, message: ConversationMessage) {
        self.messages.push_back(message);
        while self.messages.len() > MAX_STORED_MESSAGES {
            self.messages.pop_front();
        }
        self.updated_at = Utc::now();
    }

    /// Iterate over all messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    /// The `count` most recent messages, oldest first
    pub fn recent_messages(&self, count: usize) -> impl Iterator<Item = &ConversationMessage> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Most recent message that carried recommendation cards
    pub fn last_cards(&self) -> Option<&ConversationMessage> {
        self.messages.iter().rev().find(|m| m.show_cards)
    }
}
