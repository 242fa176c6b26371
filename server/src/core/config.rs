//! Configuration - loaded from the environment (and `.env` when present)

use crate::translation::{
    DAILY_TRANSLATION_LIMIT, GatewayOptions, GeminiTranslator, Translator, UnconfiguredTranslator,
};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "change-me-before-deploying";
const DEFAULT_TRANSLATION_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TRANSLATION_MODEL: &str = "gemini-2.0-flash-001";

/// Where users and messages are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Invalid STORAGE_BACKEND '{other}': expected 'mysql' or 'memory'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub app_env: String,
    pub storage_backend: StorageBackend,
    pub translation_api_url: String,
    pub translation_api_key: Option<String>,
    pub translation_model: String,
    pub translation_timeout_ms: u64,
    pub daily_translation_limit: i32,
}

fn parse_var<T: FromStr>(name: &str, default: &str, hint: &str) -> Result<T, String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("Invalid {name}: {hint}"))
}

impl Config {
    /// Reads the configuration from environment variables, calling `dotenv()` first.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let storage_backend: StorageBackend = parse_var("STORAGE_BACKEND", "mysql", "expected 'mysql' or 'memory'")?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::MySql && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORAGE_BACKEND is mysql".to_string());
        }

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = parse_var("SERVER_PORT", "3000", "must be a number between 0-65535")?;
        let max_connections = parse_var("MAX_DB_CONNECTIONS", "100", "must be a positive number")?;
        let connection_lifetime_secs =
            parse_var("DB_CONNECTION_LIFETIME_SECS", "1800", "must be a positive number")?;
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let translation_api_url =
            env::var("TRANSLATION_API_URL").unwrap_or_else(|_| DEFAULT_TRANSLATION_API_URL.to_string());
        let translation_api_key = env::var("TRANSLATION_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let translation_model =
            env::var("TRANSLATION_MODEL").unwrap_or_else(|_| DEFAULT_TRANSLATION_MODEL.to_string());
        let translation_timeout_ms =
            parse_var("TRANSLATION_TIMEOUT_MS", "8000", "must be a number of milliseconds")?;
        let daily_translation_limit = parse_var(
            "DAILY_TRANSLATION_LIMIT",
            &DAILY_TRANSLATION_LIMIT.to_string(),
            "must be a non-negative number",
        )?;
        if daily_translation_limit < 0 {
            return Err("Invalid DAILY_TRANSLATION_LIMIT: must be a non-negative number".to_string());
        }

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            app_env,
            storage_backend,
            translation_api_url,
            translation_api_key,
            translation_model,
            translation_timeout_ms,
            daily_translation_limit,
        })
    }

    /// Translator backing the gateway. Without an API key every translation
    /// fails softly and messages keep only their common text.
    pub fn translator(&self) -> Arc<dyn Translator> {
        match &self.translation_api_key {
            Some(key) => Arc::new(GeminiTranslator::new(
                self.translation_api_url.clone(),
                key.clone(),
                self.translation_model.clone(),
            )),
            None => Arc::new(UnconfiguredTranslator),
        }
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            timeout: Duration::from_millis(self.translation_timeout_ms),
            daily_limit: self.daily_translation_limit,
        }
    }

    /// Logs the configuration, secrets masked.
    pub fn print_info(&self) {
        info!(env = %self.app_env, address = %format!("{}:{}", self.server_host, self.server_port), "Server configuration");
        match (&self.storage_backend, &self.database_url) {
            (StorageBackend::MySql, Some(url)) => info!(
                database = %Self::mask_url(url),
                max_connections = self.max_connections,
                connection_lifetime_secs = self.connection_lifetime_secs,
                "Storage: MySQL"
            ),
            _ => info!("Storage: in memory, data is lost on restart"),
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT secret: USING DEFAULT (INSECURE!)");
        }
        match self.translation_api_key {
            Some(_) => info!(
                model = %self.translation_model,
                timeout_ms = self.translation_timeout_ms,
                daily_limit = self.daily_translation_limit,
                "Translation enabled"
            ),
            None => warn!("TRANSLATION_API_KEY not set, translations disabled"),
        }
    }

    /// Hides the credentials of a database URL.
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}
