//! Translation services - free-text translation, usage and settings

use crate::core::{AppError, AppState};
use crate::dtos::{
    TranslateResponseDTO, TranslateTextDTO, TranslationStatsDTO, UpdateTranslationSettingsDTO, UserDTO,
};
use crate::entities::{QuotaDecision, User};
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Translates arbitrary text for the caller, charged to their daily quota.
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn translate_text(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<TranslateTextDTO>,
) -> Result<Json<TranslateResponseDTO>, AppError> {
    body.validate()?;

    let remaining = match state
        .translation
        .check_and_consume_quota(current_user.user_id)
        .await?
    {
        QuotaDecision::Allowed { remaining } => remaining,
        QuotaDecision::Exceeded => {
            return Err(AppError::too_many_requests("Daily translation limit exceeded")
                .with_details("limit_exceeded"));
        }
    };

    let translated_text = state
        .translation
        .translate(&body.text, &body.target_language)
        .await
        .ok_or_else(|| AppError::bad_gateway("Translation failed"))?;

    Ok(Json(TranslateResponseDTO {
        original_text: body.text,
        translated_text,
        target_language: body.target_language,
        remaining_translations: remaining,
    }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_translation_stats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TranslationStatsDTO>, AppError> {
    Ok(Json(state.translation.stats(current_user.user_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_translation_settings(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateTranslationSettingsDTO>,
) -> Result<Json<UserDTO>, AppError> {
    body.validate()?;
    let updated = state
        .user
        .update_translation_settings(&current_user.user_id, &body)
        .await?;
    info!(
        translation_enabled = updated.translation_enabled,
        preferred_language = %updated.preferred_language,
        "Translation settings updated"
    );
    Ok(Json(UserDTO::from(updated)))
}
