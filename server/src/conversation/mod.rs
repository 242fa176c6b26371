//! Conversation module - the operations users perform on their direct conversations

pub mod service;

pub use service::ConversationService;
