//! Services module - HTTP handlers grouped by feature

pub mod auth;
pub mod message;
pub mod translation;
pub mod user;

pub use auth::{login_user, register_user};
pub use message::{
    clear_conversation, delete_message, edit_message, get_messages, send_message,
    update_receiver_text, update_sender_text,
};
pub use translation::{get_translation_stats, translate_text, update_translation_settings};
pub use user::list_users_for_sidebar;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
