//! Translation module - external translator and the quota-checked gateway in front of it
//!
//! - `translator`: the `Translator` port and its HTTP implementation
//! - `gateway`: per-user daily quota, timeout and failure handling around the translator

pub mod gateway;
pub mod translator;

pub use gateway::{DAILY_TRANSLATION_LIMIT, GatewayOptions, TranslationGateway, TranslationOutcome, today};
pub use translator::{GeminiTranslator, TranslationError, Translator, UnconfiguredTranslator};
