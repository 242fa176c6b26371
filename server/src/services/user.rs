//! User services - the conversation sidebar

use crate::core::{AppError, AppState};
use crate::dtos::UserDTO;
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Every user other than the caller, ordered by username.
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_users_for_sidebar(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let users = state.user.list_except(&current_user.user_id).await?;
    info!(count = users.len(), "Sidebar users loaded");
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}
