//! Conversation memory
//!
//! Per-session turn history used as context for the language-model
//! collaborators and for redrawing earlier recommendation cards.

pub mod store;

pub use store::{ConversationHistory, ConversationMessage, MessageRole, MAX_STORED_MESSAGES};
