//! Conversation Service - send, edit, delete and on-demand translation of messages

use crate::core::AppError;
use crate::dtos::{CreateMessageDTO, SendMessageDTO, UpdateMessageDTO};
use crate::entities::{Message, QuotaDecision, TranslationSide, User};
use crate::repositories::{MessageStore, UserStore};
use crate::translation::{TranslationGateway, TranslationOutcome};
use crate::ws::{DeliveryEvent, DeliveryFanout};
use futures::future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[derive(Clone)]
pub struct ConversationService {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
    translation: Arc<TranslationGateway>,
    fanout: DeliveryFanout,
}

impl ConversationService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
        translation: Arc<TranslationGateway>,
        fanout: DeliveryFanout,
    ) -> Self {
        Self {
            messages,
            users,
            translation,
            fanout,
        }
    }

    /// Stores a new message from `sender_id` to `receiver_id`, translates it eagerly
    /// for both participants and pushes it to the receiver if connected.
    ///
    /// Translation never fails the send: quota exhaustion, translator errors and
    /// storage errors on the translation fields only leave that field unset.
    #[instrument(skip(self, content))]
    pub async fn send(
        &self,
        sender_id: i32,
        receiver_id: i32,
        content: SendMessageDTO,
    ) -> Result<Message, AppError> {
        let content = content.normalized();
        content.validate()?;
        if !content.has_content() {
            warn!("Empty message rejected");
            return Err(AppError::bad_request("Message must contain text, an image or an audio"));
        }

        let sender = self
            .users
            .read(&sender_id)
            .await?
            .ok_or_else(|| AppError::not_found("Sender not found"))?;
        let receiver = self
            .users
            .read(&receiver_id)
            .await?
            .ok_or_else(|| AppError::not_found("Receiver not found"))?;

        let created = self
            .messages
            .create(&CreateMessageDTO {
                sender_id,
                receiver_id,
                common_text: content.text,
                image: content.image,
                audio: content.audio,
            })
            .await?;
        info!(message_id = created.message_id, "Message stored");

        let message = match created.common_text.clone() {
            Some(text) => self.translate_new_message(created, &sender, &receiver, &text).await,
            None => created,
        };

        self.fanout
            .notify(receiver_id, DeliveryEvent::NewMessage(message.clone()));
        Ok(message)
    }

    /// Runs both eager translations concurrently and stores whatever succeeded.
    async fn translate_new_message(
        &self,
        mut message: Message,
        sender: &User,
        receiver: &User,
        text: &str,
    ) -> Message {
        let (sender_outcome, receiver_outcome) = future::join(
            self.translation.translate_for(sender, text),
            self.translation.translate_for(receiver, text),
        )
        .await;

        for (side, outcome) in [
            (TranslationSide::Sender, sender_outcome),
            (TranslationSide::Receiver, receiver_outcome),
        ] {
            let translated = match outcome {
                TranslationOutcome::Translated(translated) => translated,
                other => {
                    debug!(side = side.as_str(), outcome = ?other, "No translation stored");
                    continue;
                }
            };
            match self
                .messages
                .set_translation(&message.message_id, side, &translated, Some(text))
                .await
            {
                Ok(Some(updated)) => message = updated,
                Ok(None) => warn!(side = side.as_str(), "Message changed before translation was stored"),
                Err(e) => warn!(side = side.as_str(), error = ?e, "Failed to store translation"),
            }
        }
        message
    }

    /// Replaces the text of a message. Only its sender may edit it.
    /// Both translations are cleared and regenerated lazily on demand.
    #[instrument(skip(self, new_text))]
    pub async fn edit_text(
        &self,
        message_id: i32,
        requester: i32,
        new_text: &str,
    ) -> Result<Message, AppError> {
        let message = self
            .messages
            .read(&message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.sender_id != requester {
            warn!("Edit attempted by a user other than the sender");
            return Err(AppError::forbidden("Only the sender can edit this message"));
        }

        if new_text.trim().is_empty() {
            return Err(AppError::bad_request("Message text cannot be empty"));
        }

        let updated = self
            .messages
            .update(
                &message_id,
                &UpdateMessageDTO {
                    common_text: Some(new_text.to_string()),
                    sender_text: Some(String::new()),
                    receiver_text: Some(String::new()),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;
        info!("Message edited, translations cleared");

        self.fanout
            .notify(updated.receiver_id, DeliveryEvent::MessageEdited(updated.clone()));
        Ok(updated)
    }

    /// Deletes one message on behalf of either participant.
    #[instrument(skip(self))]
    pub async fn delete_one(&self, message_id: i32, requester: i32) -> Result<(), AppError> {
        let message = self
            .messages
            .read(&message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if !message.is_participant(requester) {
            warn!("Delete attempted by a non participant");
            return Err(AppError::forbidden("You are not a participant of this conversation"));
        }

        if !self.messages.delete(&message_id).await? {
            // deleted concurrently by the other participant
            return Err(AppError::not_found("Message not found"));
        }
        info!("Message deleted");

        self.fanout.notify(
            message.counterpart(requester),
            DeliveryEvent::MessageDeleted { message_id },
        );
        Ok(())
    }

    /// Deletes every message between `user_a` and `user_b`. The requester must be
    /// one of the two. Returns how many messages were removed.
    #[instrument(skip(self))]
    pub async fn delete_conversation(
        &self,
        user_a: i32,
        user_b: i32,
        requester: i32,
    ) -> Result<u64, AppError> {
        if requester != user_a && requester != user_b {
            warn!("Conversation clear attempted by a non participant");
            return Err(AppError::forbidden("You can only clear your own conversations"));
        }

        let deleted = self.messages.delete_conversation(&user_a, &user_b).await?;
        info!(deleted, "Conversation cleared");

        let other = if requester == user_a { user_b } else { user_a };
        if other != requester {
            self.fanout
                .notify(other, DeliveryEvent::ConversationCleared { user_id: requester });
        }
        Ok(deleted)
    }

    /// Translation of `message_id` in the receiver's language, produced on demand.
    pub async fn update_receiver_text(&self, message_id: i32, requester: i32) -> Result<String, AppError> {
        self.fill_translation(message_id, requester, TranslationSide::Receiver)
            .await
    }

    /// Translation of `message_id` in the sender's language, produced on demand.
    pub async fn update_sender_text(&self, message_id: i32, requester: i32) -> Result<String, AppError> {
        self.fill_translation(message_id, requester, TranslationSide::Sender)
            .await
    }

    /// Lazily fills one translation field. An already present translation is
    /// returned without touching the quota. Only the participant on `side` may
    /// ask; anyone else gets 401 and nothing is mutated or consumed.
    #[instrument(skip(self), fields(side = side.as_str()))]
    async fn fill_translation(
        &self,
        message_id: i32,
        requester: i32,
        side: TranslationSide,
    ) -> Result<String, AppError> {
        let message = self
            .messages
            .read(&message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.participant(side) != requester {
            warn!("Translation requested by the wrong participant");
            return Err(match side {
                TranslationSide::Receiver => {
                    AppError::unauthorized("Only the receiver can translate this message")
                }
                TranslationSide::Sender => {
                    AppError::unauthorized("Only the sender can translate this message")
                }
            });
        }

        if let Some(existing) = message.translation(side) {
            debug!("Translation already present");
            return Ok(existing.to_string());
        }

        let user = self
            .users
            .read(&requester)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.translation_enabled {
            return Err(AppError::bad_request("Translation is disabled for this user"));
        }

        let Some(text) = message.common_text.clone() else {
            return Err(AppError::bad_request("Message has no text to translate"));
        };

        if let QuotaDecision::Exceeded = self.translation.check_and_consume_quota(requester).await? {
            return Err(AppError::too_many_requests("Daily translation limit exceeded")
                .with_details("limit_exceeded"));
        }

        let translated = self
            .translation
            .translate(&text, &user.preferred_language)
            .await
            .ok_or_else(|| AppError::bad_gateway("Translation failed"))?;

        let stored = self
            .messages
            .set_translation(&message_id, side, &translated, Some(&text))
            .await?
            .ok_or_else(|| AppError::conflict("Message was edited while translating, retry"))?;
        info!("Translation stored");

        Ok(stored.translation(side).unwrap_or(&translated).to_string())
    }

    /// Messages between `viewer` and `other`, oldest first.
    #[instrument(skip(self))]
    pub async fn get_conversation(&self, viewer: i32, other: i32) -> Result<Vec<Message>, AppError> {
        if self.users.read(&other).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        let messages = self.messages.find_conversation(&viewer, &other).await?;
        debug!(count = messages.len(), "Conversation loaded");
        Ok(messages)
    }
}
