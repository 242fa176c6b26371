//! WebSocket Event DTOs - events pushed to and received from connected clients

use crate::dtos::{MessageDTO, SendMessageDTO};
use serde::{Deserialize, Serialize};

/// Tagged union for server -> client events.
/// Serde serializes this as:
/// { "type": "NewMessage", "data": { ... } }
/// or
/// { "type": "MessageDeleted", "data": { "message_id": 4 } }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    NewMessage(MessageDTO),
    MessageEdited(MessageDTO),
    MessageDeleted { message_id: i32 },
    ConversationCleared { user_id: i32 },
    OnlineUsers(Vec<i32>),
    Error { code: u16, message: String },
}

/// Client -> server events.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum ClientEventDTO {
    SendMessage {
        receiver_id: i32,
        #[serde(flatten)]
        content: SendMessageDTO,
    },
}
