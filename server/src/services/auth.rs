//! Auth services - registration and login

use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{AuthResponseDTO, CreateUserDTO, LoginDTO, UserDTO};
use crate::entities::User;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::core::auth::TOKEN_TTL_HOURS;

/// Token in a body, in an `Authorization` header and in an HttpOnly cookie.
fn auth_response(token: String, user: User, status: StatusCode) -> Result<impl IntoResponse, AppError> {
    let cookie_value = format!(
        "token={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        TOKEN_TTL_HOURS * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        "Set-Cookie",
        HeaderValue::from_str(&cookie_value)
            .map_err(|_| AppError::internal_server_error("Failed to build auth cookie"))?,
    );
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Failed to build auth header"))?,
    );

    Ok((
        status,
        headers,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(user),
        }),
    ))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<impl IntoResponse, AppError> {
    if body.password.is_empty() {
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    let user = match state.user.find_by_username(&body.username).await? {
        Some(user) => user,
        None => {
            warn!("Login for unknown user");
            return Err(AppError::unauthorized("Invalid username or password"));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Wrong password");
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    let token = encode_jwt(&user.username, user.user_id, &state.jwt_secret)?;
    info!(user_id = user.user_id, "User logged in");
    auth_response(token, user, StatusCode::OK)
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    if state.user.find_by_username(&body.username).await?.is_some() {
        return Err(AppError::conflict("Username already exists"));
    }

    let password_hash = User::hash_password(&body.password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let created_user = state
        .user
        .create(&CreateUserDTO {
            username: body.username,
            password: password_hash,
        })
        .await?;

    let token = encode_jwt(&created_user.username, created_user.user_id, &state.jwt_secret)?;
    info!(user_id = created_user.user_id, "User registered");
    auth_response(token, created_user, StatusCode::CREATED)
}
