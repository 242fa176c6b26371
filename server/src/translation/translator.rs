//! Translator - text translation backed by a generative language model API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug)]
pub enum TranslationError {
    /// No API key configured, translations are disabled server-side.
    NotConfigured,
    Http(reqwest::Error),
    Upstream { status: StatusCode, body: String },
    EmptyResponse,
    Timeout,
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::NotConfigured => write!(f, "translator is not configured"),
            TranslationError::Http(e) => write!(f, "translation request failed: {e}"),
            TranslationError::Upstream { status, body } => {
                write!(f, "translation service answered {status}: {body}")
            }
            TranslationError::EmptyResponse => write!(f, "translation service returned no text"),
            TranslationError::Timeout => write!(f, "translation timed out"),
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        TranslationError::Http(err)
    }
}

/// External text-translation capability.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError>;
}

/// Stand-in used when no API key is configured: every call fails softly.
pub struct UnconfiguredTranslator;

#[async_trait]
impl Translator for UnconfiguredTranslator {
    async fn translate(&self, _text: &str, _target_language: &str) -> Result<String, TranslationError> {
        Err(TranslationError::NotConfigured)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of every returned part, trimmed.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Translator calling a Gemini `generateContent` endpoint.
pub struct GeminiTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiTranslator {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn make_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

pub(crate) fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text to {target_language}. Only return the translated text, nothing else: \"{text}\""
    )
}

#[async_trait]
impl Translator for GeminiTranslator {
    #[instrument(skip(self, text), fields(target_language = %target_language, model = %self.model))]
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let prompt = translation_prompt(text, target_language);
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.make_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Upstream { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let translated = parsed.into_text();

        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        debug!(chars = translated.chars().count(), "Translation received");
        Ok(translated)
    }
}
