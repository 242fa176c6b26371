//! UserRepository - MySQL storage for users and their translation quota

use super::UserStore;
use crate::dtos::{CreateUserDTO, UpdateTranslationSettingsDTO};
use crate::entities::{DEFAULT_LANGUAGE, QuotaDecision, User};
use async_trait::async_trait;
use sqlx::{Error, MySqlPool};
use tracing::{debug, instrument};

const SELECT_BY_ID: &str = r#"
    SELECT user_id, username, password, translation_enabled, preferred_language,
           daily_translation_count, last_translation_date
    FROM users
    WHERE user_id = ?
"#;

const SELECT_BY_USERNAME: &str = r#"
    SELECT user_id, username, password, translation_enabled, preferred_language,
           daily_translation_count, last_translation_date
    FROM users
    WHERE username = ?
"#;

const SELECT_ALL_EXCEPT: &str = r#"
    SELECT user_id, username, password, translation_enabled, preferred_language,
           daily_translation_count, last_translation_date
    FROM users
    WHERE user_id <> ?
    ORDER BY username ASC
"#;

// Single statement read-modify-write: MySQL assigns SET clauses left to right, so the
// count is computed against the previous date before the date is overwritten.
const CONSUME_TRANSLATION: &str = r#"
    UPDATE users
    SET daily_translation_count = IF(last_translation_date = ?, daily_translation_count + 1, 1),
        last_translation_date = ?
    WHERE user_id = ?
      AND ? > 0
      AND (last_translation_date <> ? OR daily_translation_count < ?)
"#;

// USER REPO
pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, translation_enabled, preferred_language,
                               daily_translation_count, last_translation_date)
            VALUES (?, ?, FALSE, ?, 0, '')
            "#,
        )
        .bind(&data.username)
        .bind(&data.password)
        .bind(DEFAULT_LANGUAGE)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        Ok(User {
            user_id: new_id,
            username: data.username.clone(),
            password: data.password.clone(),
            translation_enabled: false,
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            daily_translation_count: 0,
            last_translation_date: String::new(),
        })
    }

    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// username is unique
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(SELECT_BY_USERNAME)
            .bind(username)
            .fetch_optional(&self.connection_pool)
            .await
    }

    async fn list_except(&self, user_id: &i32) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(SELECT_ALL_EXCEPT)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    async fn update_translation_settings(
        &self,
        id: &i32,
        data: &UpdateTranslationSettingsDTO,
    ) -> Result<User, Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET translation_enabled = COALESCE(?, translation_enabled),
                preferred_language = COALESCE(?, preferred_language)
            WHERE user_id = ?
            "#,
        )
        .bind(data.translation_enabled)
        .bind(&data.preferred_language)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;
        debug!(rows = result.rows_affected(), "Translation settings written");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }

    async fn roll_translation_day(&self, id: &i32, today: &str) -> Result<User, Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET daily_translation_count = 0, last_translation_date = ?
            WHERE user_id = ? AND last_translation_date <> ?
            "#,
        )
        .bind(today)
        .bind(id)
        .bind(today)
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }

    #[instrument(skip(self))]
    async fn consume_translation(
        &self,
        id: &i32,
        today: &str,
        daily_limit: i32,
    ) -> Result<QuotaDecision, Error> {
        let result = sqlx::query(CONSUME_TRANSLATION)
            .bind(today)
            .bind(today)
            .bind(id)
            .bind(daily_limit)
            .bind(today)
            .bind(daily_limit)
            .execute(&self.connection_pool)
            .await?;

        let user = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if result.rows_affected() == 0 {
            debug!(count = user.daily_translation_count, "Daily translation limit reached");
            return Ok(QuotaDecision::Exceeded);
        }

        Ok(QuotaDecision::Allowed {
            remaining: user.remaining_translations(today, daily_limit),
        })
    }
}
