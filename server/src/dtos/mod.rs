//! DTOs module - Data Transfer Objects
//!
//! DTOs decouple the external representation (API, WebSocket) from the internal one (entities).

pub mod message;
pub mod translation;
pub mod user;
pub mod ws_event;

pub use message::{
    ClearConversationDTO, CreateMessageDTO, DeletedCountDTO, EditMessageDTO, EditedMessageDTO,
    MessageDTO, ReceiverTextDTO, SendMessageDTO, SenderTextDTO, StatusMessageDTO,
    TranslationRequestDTO, UpdateMessageDTO,
};
pub use translation::{
    TranslateResponseDTO, TranslateTextDTO, TranslationStatsDTO, UpdateTranslationSettingsDTO,
};
pub use user::{AuthResponseDTO, CreateUserDTO, LoginDTO, UserDTO};
pub use ws_event::{ClientEventDTO, WsEventDTO};
