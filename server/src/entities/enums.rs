//! Enumerations used by the entities

use serde::{Deserialize, Serialize};

/// Which participant a derived translation belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSide {
    Sender,
    Receiver,
}

impl TranslationSide {
    /// Column holding this side's translation in the `messages` table.
    pub const fn column(&self) -> &'static str {
        match self {
            TranslationSide::Sender => "sender_text",
            TranslationSide::Receiver => "receiver_text",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TranslationSide::Sender => "sender",
            TranslationSide::Receiver => "receiver",
        }
    }
}

/// Translation state of a message, derived from its nullable text fields.
///
/// Only non-empty translations count: an empty string means the field was cleared
/// by an edit (or skipped) and has to be regenerated before it can be shown.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    NoText,
    Untranslated,
    SenderTranslated,
    ReceiverTranslated,
    BothTranslated,
}

/// Result of a quota check-and-consume on a user's daily translation counter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// A slot was consumed; `remaining` slots are left for today.
    Allowed { remaining: i32 },
    /// The daily limit is already reached; nothing was consumed.
    Exceeded,
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}
