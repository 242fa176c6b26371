//! MessageRepository - MySQL storage for messages

use super::MessageStore;
use crate::dtos::{CreateMessageDTO, UpdateMessageDTO};
use crate::entities::{Message, TranslationSide};
use async_trait::async_trait;
use sqlx::{Error, MySqlPool};
use tracing::{debug, instrument};

const SELECT_BY_ID: &str = r#"
    SELECT message_id, sender_id, receiver_id, common_text, sender_text, receiver_text,
           image, audio, created_at, updated_at
    FROM messages
    WHERE message_id = ?
"#;

const SELECT_CONVERSATION: &str = r#"
    SELECT message_id, sender_id, receiver_id, common_text, sender_text, receiver_text,
           image, audio, created_at, updated_at
    FROM messages
    WHERE (sender_id = ? AND receiver_id = ?)
       OR (sender_id = ? AND receiver_id = ?)
    ORDER BY created_at ASC, message_id ASC
"#;

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: MySqlPool,
}

impl MessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    #[instrument(skip(self, data), fields(sender_id = data.sender_id, receiver_id = data.receiver_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        // timestamps come from the column defaults
        let result = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, receiver_id, common_text, image, audio)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(&data.common_text)
        .bind(&data.image)
        .bind(&data.audio)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        debug!(message_id = new_id, "Message inserted");

        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }

    async fn read(&self, id: &i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    async fn find_conversation(&self, user_a: &i32, user_b: &i32) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(SELECT_CONVERSATION)
            .bind(user_a)
            .bind(user_b)
            .bind(user_b)
            .bind(user_a)
            .fetch_all(&self.connection_pool)
            .await
    }

    async fn update(&self, id: &i32, data: &UpdateMessageDTO) -> Result<Option<Message>, Error> {
        // First, make sure the message exists
        if self.read(id).await?.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE messages
            SET common_text = COALESCE(?, common_text),
                sender_text = COALESCE(?, sender_text),
                receiver_text = COALESCE(?, receiver_text),
                updated_at = CURRENT_TIMESTAMP(6)
            WHERE message_id = ?
            "#,
        )
        .bind(&data.common_text)
        .bind(&data.sender_text)
        .bind(&data.receiver_text)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await
    }

    #[instrument(skip(self, text, expected_common_text), fields(side = side.as_str()))]
    async fn set_translation(
        &self,
        id: &i32,
        side: TranslationSide,
        text: &str,
        expected_common_text: Option<&str>,
    ) -> Result<Option<Message>, Error> {
        // <=> is the null-safe equality, a message without text matches None
        let query = format!(
            "UPDATE messages SET {} = ?, updated_at = CURRENT_TIMESTAMP(6) \
             WHERE message_id = ? AND common_text <=> ?",
            side.column()
        );
        let result = sqlx::query(&query)
            .bind(text)
            .bind(id)
            .bind(expected_common_text)
            .execute(&self.connection_pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!("Translation not stored, message missing or edited");
            return Ok(None);
        }
        self.read(id).await
    }

    async fn delete(&self, id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM messages WHERE message_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_conversation(&self, user_a: &i32, user_b: &i32) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE (sender_id = ? AND receiver_id = ?)
               OR (sender_id = ? AND receiver_id = ?)
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected())
    }
}
