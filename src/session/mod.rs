//! Conversation state and streaming query execution
//!
//! [`LlmClient`] sends one request and folds the provider's fragments into
//! a [`StreamAccumulator`]. [`ConversationSession`] adds the message history
//! on top for callers that run queries inline.

pub mod accumulator;
pub mod client;
pub mod conversation;

pub use accumulator::StreamAccumulator;
pub use client::LlmClient;
pub use conversation::{Conversation, ConversationSession};
