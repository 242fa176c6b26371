//! Message DTOs - Data Transfer Objects for messages

use crate::entities::{Message, TranslationStatus, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct exchanged with the client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub message_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub common_text: Option<String>,
    pub sender_text: Option<String>,
    pub receiver_text: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub translation_status: TranslationStatus,
    /// Text resolved for the requesting user, only set on conversation reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            translation_status: value.translation_status(),
            message_id: value.message_id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            common_text: value.common_text,
            sender_text: value.sender_text,
            receiver_text: value.receiver_text,
            image: value.image,
            audio: value.audio,
            display_text: None,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl MessageDTO {
    /// Builds the DTO with the display text resolved for `viewer`.
    pub fn for_viewer(value: Message, viewer: &User) -> Self {
        let display_text = value.display_text_for(viewer).map(str::to_string);
        Self {
            display_text,
            ..Self::from(value)
        }
    }
}

/// Body of a send request. Image and audio are URLs of already hosted media.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct SendMessageDTO {
    #[validate(length(max = 5000, message = "Message text must be at most 5000 characters"))]
    pub text: Option<String>,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
    #[validate(url(message = "Audio must be a valid URL"))]
    pub audio: Option<String>,
}

impl SendMessageDTO {
    /// Drops blank fields so that whitespace-only text counts as absent.
    pub fn normalized(self) -> Self {
        fn keep(field: Option<String>) -> Option<String> {
            field.filter(|s| !s.trim().is_empty())
        }
        Self {
            text: keep(self.text),
            image: keep(self.image),
            audio: keep(self.audio),
        }
    }

    pub fn has_content(&self) -> bool {
        self.text.is_some() || self.image.is_some() || self.audio.is_some()
    }
}

/// DTO to create a new message (without message_id)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateMessageDTO {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub common_text: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
}

/// DTO for partial updates: only `Some` fields are written.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateMessageDTO {
    pub common_text: Option<String>,
    pub sender_text: Option<String>,
    pub receiver_text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct EditMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message text must be between 1 and 5000 characters"))]
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EditedMessageDTO {
    pub message: String,
    pub edited_message: MessageDTO,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClearConversationDTO {
    pub sender_id: i32,
    pub receiver_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeletedCountDTO {
    pub deleted_count: u64,
}

/// Body of an on-demand translation request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TranslationRequestDTO {
    pub message_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReceiverTextDTO {
    pub receiver_text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SenderTextDTO {
    pub sender_text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusMessageDTO {
    pub message: String,
}
