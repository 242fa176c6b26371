//! Message entity - canonical text plus the two derived translations

use super::enums::{TranslationSide, TranslationStatus};
use super::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub message_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    /// Text exactly as typed by the sender, source of truth for both translations.
    pub common_text: Option<String>,
    /// `common_text` in the sender's preferred language.
    pub sender_text: Option<String>,
    /// `common_text` in the receiver's preferred language.
    pub receiver_text: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl Message {
    pub fn translation_status(&self) -> TranslationStatus {
        if non_empty(&self.common_text).is_none() {
            return TranslationStatus::NoText;
        }
        match (non_empty(&self.sender_text), non_empty(&self.receiver_text)) {
            (None, None) => TranslationStatus::Untranslated,
            (Some(_), None) => TranslationStatus::SenderTranslated,
            (None, Some(_)) => TranslationStatus::ReceiverTranslated,
            (Some(_), Some(_)) => TranslationStatus::BothTranslated,
        }
    }

    /// Usable translation for `side`, if one was computed from the current text.
    pub fn translation(&self, side: TranslationSide) -> Option<&str> {
        match side {
            TranslationSide::Sender => non_empty(&self.sender_text),
            TranslationSide::Receiver => non_empty(&self.receiver_text),
        }
    }

    /// User owning the translation of `side`.
    pub fn participant(&self, side: TranslationSide) -> i32 {
        match side {
            TranslationSide::Sender => self.sender_id,
            TranslationSide::Receiver => self.receiver_id,
        }
    }

    pub fn is_participant(&self, user_id: i32) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The other participant of the conversation, seen from `user_id`.
    pub fn counterpart(&self, user_id: i32) -> i32 {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Text `viewer` should see for this message.
    ///
    /// The sender sees its own translation when enabled, the receiver sees the
    /// receiver translation when enabled; both fall back to `common_text`.
    pub fn display_text_for(&self, viewer: &User) -> Option<&str> {
        let side = if viewer.user_id == self.sender_id {
            TranslationSide::Sender
        } else if viewer.user_id == self.receiver_id {
            TranslationSide::Receiver
        } else {
            return self.common_text.as_deref();
        };

        if !viewer.translation_enabled {
            return self.common_text.as_deref();
        }
        self.translation(side).or(self.common_text.as_deref())
    }
}
