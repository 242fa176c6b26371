//! Translation DTOs - settings, usage stats and free-text translation

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct TranslateTextDTO {
    #[validate(length(min = 1, max = 5000, message = "Text must be between 1 and 5000 characters"))]
    pub text: String,
    #[validate(length(min = 1, max = 32, message = "Target language is required"))]
    pub target_language: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranslateResponseDTO {
    pub original_text: String,
    pub translated_text: String,
    pub target_language: String,
    pub remaining_translations: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranslationStatsDTO {
    pub daily_translation_count: i32,
    pub remaining_translations: i32,
    pub translation_enabled: bool,
    pub preferred_language: String,
}

/// Partial settings update: absent fields keep their current value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateTranslationSettingsDTO {
    pub translation_enabled: Option<bool>,
    #[validate(length(min = 1, max = 32, message = "Preferred language must be between 1 and 32 characters"))]
    pub preferred_language: Option<String>,
}
