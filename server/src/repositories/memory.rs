//! In-memory repositories
//!
//! Process-local implementations of the storage ports, used by the `memory`
//! storage backend and by the test suite. Each record lives in a `DashMap` entry,
//! so every mutation runs under that entry's shard lock and never across an await.

use super::{MessageStore, UserStore};
use crate::dtos::{CreateMessageDTO, CreateUserDTO, UpdateMessageDTO, UpdateTranslationSettingsDTO};
use crate::entities::{DEFAULT_LANGUAGE, Message, QuotaDecision, TranslationSide, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use sqlx::Error;
use sqlx::error::{DatabaseError, ErrorKind};
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

fn is_between(message: &Message, user_a: i32, user_b: i32) -> bool {
    (message.sender_id == user_a && message.receiver_id == user_b)
        || (message.sender_id == user_b && message.receiver_id == user_a)
}

pub struct InMemoryMessageRepository {
    messages: DashMap<i32, Message>,
    next_id: AtomicI32,
    // last issued creation timestamp, kept strictly increasing
    clock: Mutex<DateTime<Utc>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: DashMap::new(),
            next_id: AtomicI32::new(1),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn commit_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + chrono::Duration::microseconds(1)
        };
        *last = next;
        next
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageRepository {
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = self.commit_timestamp();
        let message = Message {
            message_id,
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            common_text: data.common_text.clone(),
            sender_text: None,
            receiver_text: None,
            image: data.image.clone(),
            audio: data.audio.clone(),
            created_at: now,
            updated_at: now,
        };
        self.messages.insert(message_id, message.clone());
        Ok(message)
    }

    async fn read(&self, id: &i32) -> Result<Option<Message>, Error> {
        Ok(self.messages.get(id).map(|m| m.value().clone()))
    }

    async fn find_conversation(&self, user_a: &i32, user_b: &i32) -> Result<Vec<Message>, Error> {
        let mut conversation: Vec<Message> = self
            .messages
            .iter()
            .filter(|entry| is_between(entry.value(), *user_a, *user_b))
            .map(|entry| entry.value().clone())
            .collect();
        conversation.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.message_id.cmp(&b.message_id))
        });
        Ok(conversation)
    }

    async fn update(&self, id: &i32, data: &UpdateMessageDTO) -> Result<Option<Message>, Error> {
        let Some(mut entry) = self.messages.get_mut(id) else {
            return Ok(None);
        };
        let message = entry.value_mut();
        if let Some(text) = &data.common_text {
            message.common_text = Some(text.clone());
        }
        if let Some(text) = &data.sender_text {
            message.sender_text = Some(text.clone());
        }
        if let Some(text) = &data.receiver_text {
            message.receiver_text = Some(text.clone());
        }
        message.updated_at = Utc::now();
        Ok(Some(message.clone()))
    }

    async fn set_translation(
        &self,
        id: &i32,
        side: TranslationSide,
        text: &str,
        expected_common_text: Option<&str>,
    ) -> Result<Option<Message>, Error> {
        let Some(mut entry) = self.messages.get_mut(id) else {
            return Ok(None);
        };
        let message = entry.value_mut();
        if message.common_text.as_deref() != expected_common_text {
            return Ok(None);
        }
        match side {
            TranslationSide::Sender => message.sender_text = Some(text.to_string()),
            TranslationSide::Receiver => message.receiver_text = Some(text.to_string()),
        }
        message.updated_at = Utc::now();
        Ok(Some(message.clone()))
    }

    async fn delete(&self, id: &i32) -> Result<bool, Error> {
        Ok(self.messages.remove(id).is_some())
    }

    async fn delete_conversation(&self, user_a: &i32, user_b: &i32) -> Result<u64, Error> {
        let mut removed = 0u64;
        self.messages.retain(|_, message| {
            if is_between(message, *user_a, *user_b) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

/// Raised by [`InMemoryUserRepository::create`] for a taken username. Reported
/// as a unique violation, like the `users.username` constraint in MySQL.
#[derive(Debug)]
pub struct DuplicateUsername;

impl fmt::Display for DuplicateUsername {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Duplicate entry for key 'users.username'")
    }
}

impl std::error::Error for DuplicateUsername {}

impl DatabaseError for DuplicateUsername {
    fn message(&self) -> &str {
        "Duplicate entry for key 'users.username'"
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some("username")
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

pub struct InMemoryUserRepository {
    users: DashMap<i32, User>,
    // username -> user_id, the entry lock makes check-and-insert atomic
    usernames: DashMap<String, i32>,
    next_id: AtomicI32,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            usernames: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    /// Inserts or replaces a full record, keeping its id.
    pub fn insert(&self, user: User) {
        self.next_id.fetch_max(user.user_id + 1, Ordering::SeqCst);
        let username = user.username.clone();
        self.usernames.insert(username.clone(), user.user_id);
        if let Some(previous) = self.users.insert(user.user_id, user) {
            if previous.username != username {
                self.usernames
                    .remove_if(&previous.username, |_, id| *id == previous.user_id);
            }
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let slot = match self.usernames.entry(data.username.clone()) {
            Entry::Occupied(_) => return Err(Error::Database(Box::new(DuplicateUsername))),
            Entry::Vacant(slot) => slot,
        };
        let user_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            user_id,
            username: data.username.clone(),
            password: data.password.clone(),
            translation_enabled: false,
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            daily_translation_count: 0,
            last_translation_date: String::new(),
        };
        self.users.insert(user_id, user.clone());
        slot.insert(user_id);
        Ok(user)
    }

    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let Some(user_id) = self.usernames.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn list_except(&self, user_id: &i32) -> Result<Vec<User>, Error> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.key() != user_id)
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_translation_settings(
        &self,
        id: &i32,
        data: &UpdateTranslationSettingsDTO,
    ) -> Result<User, Error> {
        let mut entry = self.users.get_mut(id).ok_or(Error::RowNotFound)?;
        let user = entry.value_mut();
        if let Some(enabled) = data.translation_enabled {
            user.translation_enabled = enabled;
        }
        if let Some(language) = &data.preferred_language {
            user.preferred_language = language.clone();
        }
        Ok(user.clone())
    }

    async fn roll_translation_day(&self, id: &i32, today: &str) -> Result<User, Error> {
        let mut entry = self.users.get_mut(id).ok_or(Error::RowNotFound)?;
        entry.value_mut().roll_translation_day(today);
        Ok(entry.value().clone())
    }

    async fn consume_translation(
        &self,
        id: &i32,
        today: &str,
        daily_limit: i32,
    ) -> Result<QuotaDecision, Error> {
        let mut entry = self.users.get_mut(id).ok_or(Error::RowNotFound)?;
        let user = entry.value_mut();
        if user.try_consume_translation(today, daily_limit) {
            Ok(QuotaDecision::Allowed {
                remaining: user.remaining_translations(today, daily_limit),
            })
        } else {
            Ok(QuotaDecision::Exceeded)
        }
    }
}
