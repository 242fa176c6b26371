//! Storage ports
//!
//! Services only talk to these traits; the MySQL repositories and the in-memory
//! ones implement them. Errors stay `sqlx::Error` on both backends so the HTTP
//! layer maps them in one place.

use crate::dtos::{CreateMessageDTO, CreateUserDTO, UpdateMessageDTO, UpdateTranslationSettingsDTO};
use crate::entities::{Message, QuotaDecision, TranslationSide, User};
use async_trait::async_trait;
use sqlx::Error;

/// Durable record of every message and its translation fields.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a new message and returns it with its id and timestamps.
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error>;

    /// Point lookup by primary key.
    async fn read(&self, id: &i32) -> Result<Option<Message>, Error>;

    /// Every message exchanged between `user_a` and `user_b`, in both directions,
    /// oldest first (commit timestamp, then id).
    async fn find_conversation(&self, user_a: &i32, user_b: &i32) -> Result<Vec<Message>, Error>;

    /// Partial update: only `Some` fields of `data` are written.
    ///
    /// # Returns
    /// * `Ok(Some(Message))` - Updated message
    /// * `Ok(None)` - No message with that id
    async fn update(&self, id: &i32, data: &UpdateMessageDTO) -> Result<Option<Message>, Error>;

    /// Stores the translation of `side` only if `common_text` still equals
    /// `expected_common_text`, i.e. the text that was translated.
    ///
    /// # Returns
    /// * `Ok(Some(Message))` - Translation stored
    /// * `Ok(None)` - Message missing, or edited since the translation started
    async fn set_translation(
        &self,
        id: &i32,
        side: TranslationSide,
        text: &str,
        expected_common_text: Option<&str>,
    ) -> Result<Option<Message>, Error>;

    /// Deletes one message. Returns false if it did not exist.
    async fn delete(&self, id: &i32) -> Result<bool, Error>;

    /// Deletes every message between the two users, both directions.
    /// Returns the number of removed records.
    async fn delete_conversation(&self, user_a: &i32, user_b: &i32) -> Result<u64, Error>;
}

/// User records as far as chat and translation are concerned.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error>;

    async fn read(&self, id: &i32) -> Result<Option<User>, Error>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Every user except `user_id`, ordered by username.
    async fn list_except(&self, user_id: &i32) -> Result<Vec<User>, Error>;

    /// Writes the provided settings. `Err(RowNotFound)` if the user is missing.
    async fn update_translation_settings(
        &self,
        id: &i32,
        data: &UpdateTranslationSettingsDTO,
    ) -> Result<User, Error>;

    /// Resets a stale daily counter and persists it. `Err(RowNotFound)` if the
    /// user is missing.
    async fn roll_translation_day(&self, id: &i32, today: &str) -> Result<User, Error>;

    /// Atomic per-user check-and-consume of one translation slot:
    /// day roll-over, limit check, increment, persist.
    /// `Err(RowNotFound)` if the user is missing.
    async fn consume_translation(
        &self,
        id: &i32,
        today: &str,
        daily_limit: i32,
    ) -> Result<QuotaDecision, Error>;
}
