//! Entities module - Domain entities
//!
//! Every entity here mirrors a persisted record (a table row in the MySQL backend,
//! a map entry in the in-memory one).

pub mod enums;
pub mod message;
pub mod user;

pub use enums::{QuotaDecision, TranslationSide, TranslationStatus};
pub use message::Message;
pub use user::{DEFAULT_LANGUAGE, User};
