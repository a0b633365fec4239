//! 복지나침반 (Welfare Compass)
//!
//! A conversational matcher for Seoul welfare programs that:
//! - Builds a user profile incrementally from free-form Korean messages
//! - Gates users living outside Seoul before any matching happens
//! - Filters, scores and diversifies programs from a CSV catalog
//! - Answers follow-up questions about previously matched programs
//! - Falls back to rule-based collaborators when no LLM is configured
//!
//! TURN LOOP:
//! CLASSIFY → EXTRACT → MERGE → REGION GATE → MATCH → GENERATE

pub mod api;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod conversational;
pub mod error;
pub mod extractor;
pub mod gemini;
pub mod matching;
pub mod median;
pub mod memory;
pub mod models;
pub mod profile;
pub mod region;
pub mod responder;
pub mod state;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::IntentClassifier;
pub use conversational::{Compass, ConversationContext};
