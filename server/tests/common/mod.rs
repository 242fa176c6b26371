#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use server::core::{AppState, encode_jwt};
use server::entities::{DEFAULT_LANGUAGE, User};
use server::repositories::{InMemoryMessageRepository, InMemoryUserRepository};
use server::translation::{GatewayOptions, TranslationError, Translator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const JWT_SECRET: &str = "a-test-secret-that-is-long-enough";

/// Translator double: returns `"[<language>] <text>"` and counts its calls.
#[derive(Default)]
pub struct MockTranslator {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(format!("[{target_language}] {text}"))
    }
}

/// In-memory application wired to a mock translator, with direct access to the stores.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub server: TestServer,
    pub users: Arc<InMemoryUserRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub translator: Arc<MockTranslator>,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let translator = Arc::new(MockTranslator::default());
        let state = Arc::new(AppState::from_stores(
            users.clone(),
            messages.clone(),
            JWT_SECRET.to_string(),
            translator.clone(),
            GatewayOptions::default(),
        ));
        let server = TestServer::new(server::create_router(state.clone()))
            .expect("Failed to create test server");
        Self {
            state,
            server,
            users,
            messages,
            translator,
        }
    }

    /// Seeds a user. `language = None` leaves translation disabled.
    pub fn seed_user(&self, user_id: i32, username: &str, language: Option<&str>) -> User {
        let user = User {
            user_id,
            username: username.to_string(),
            password: String::new(),
            translation_enabled: language.is_some(),
            preferred_language: language.unwrap_or(DEFAULT_LANGUAGE).to_string(),
            daily_translation_count: 0,
            last_translation_date: String::new(),
        };
        self.users.insert(user.clone());
        user
    }

    pub fn token_for(&self, user: &User) -> String {
        encode_jwt(&user.username, user.user_id, JWT_SECRET).expect("Failed to create JWT token")
    }

    pub fn bearer(&self, user: &User) -> String {
        format!("Bearer {}", self.token_for(user))
    }

    pub async fn stored_user(&self, user_id: i32) -> User {
        use server::repositories::UserStore;
        self.users
            .read(&user_id)
            .await
            .expect("store failure")
            .expect("user exists")
    }
}
