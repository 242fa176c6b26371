//! Message services - HTTP surface of the conversation service

use crate::core::{AppError, AppState};
use crate::dtos::{
    ClearConversationDTO, DeletedCountDTO, EditMessageDTO, EditedMessageDTO, MessageDTO,
    ReceiverTextDTO, SendMessageDTO, SenderTextDTO, StatusMessageDTO, TranslationRequestDTO,
};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(other_user_id): Path<i32>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    let messages = state
        .conversation
        .get_conversation(current_user.user_id, other_user_id)
        .await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageDTO::for_viewer(m, &current_user))
            .collect(),
    ))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(receiver_id): Path<i32>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    let message = state
        .conversation
        .send(current_user.user_id, receiver_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDTO::for_viewer(message, &current_user))))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(message_id): Path<i32>,
    Json(body): Json<EditMessageDTO>,
) -> Result<Json<EditedMessageDTO>, AppError> {
    body.validate()?;
    let message = state
        .conversation
        .edit_text(message_id, current_user.user_id, &body.text)
        .await?;
    Ok(Json(EditedMessageDTO {
        message: "Message updated successfully".to_string(),
        edited_message: MessageDTO::for_viewer(message, &current_user),
    }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(message_id): Path<i32>,
) -> Result<Json<StatusMessageDTO>, AppError> {
    state
        .conversation
        .delete_one(message_id, current_user.user_id)
        .await?;
    Ok(Json(StatusMessageDTO {
        message: "Message deleted successfully".to_string(),
    }))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn clear_conversation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ClearConversationDTO>,
) -> Result<Json<DeletedCountDTO>, AppError> {
    let deleted_count = state
        .conversation
        .delete_conversation(body.sender_id, body.receiver_id, current_user.user_id)
        .await?;
    Ok(Json(DeletedCountDTO { deleted_count }))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, message_id = body.message_id))]
pub async fn update_receiver_text(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<TranslationRequestDTO>,
) -> Result<Json<ReceiverTextDTO>, AppError> {
    let receiver_text = state
        .conversation
        .update_receiver_text(body.message_id, current_user.user_id)
        .await?;
    Ok(Json(ReceiverTextDTO { receiver_text }))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, message_id = body.message_id))]
pub async fn update_sender_text(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<TranslationRequestDTO>,
) -> Result<Json<SenderTextDTO>, AppError> {
    let sender_text = state
        .conversation
        .update_sender_text(body.message_id, current_user.user_id)
        .await?;
    Ok(Json(SenderTextDTO { sender_text }))
}
