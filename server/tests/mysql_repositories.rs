//! Integration tests for the MySQL repositories
//!
//! These tests use `#[sqlx::test]`, which:
//! - creates a fresh database per test from `DATABASE_URL`
//! - applies `./migrations` and then the listed fixtures
//!
//! They need a reachable MySQL server, run them with
//! `DATABASE_URL=mysql://... cargo test -- --ignored`.
//!
//! Fixtures: maria (1) used 15 translations on 2024-03-09, pierre (2) used
//! 14 on 2024-03-10, john (3) never translated. Messages 1 and 2 are between
//! maria and pierre, message 3 between maria and john.

#[cfg(test)]
mod mysql_tests {
    use server::dtos::{CreateMessageDTO, UpdateMessageDTO};
    use server::entities::{QuotaDecision, TranslationSide};
    use server::repositories::{MessageRepository, MessageStore, UserRepository, UserStore};
    use sqlx::MySqlPool;

    const TODAY: &str = "2024-03-10";
    const LIMIT: i32 = 15;

    fn text_message(sender_id: i32, receiver_id: i32, text: &str) -> CreateMessageDTO {
        CreateMessageDTO {
            sender_id,
            receiver_id,
            common_text: Some(text.to_string()),
            image: None,
            audio: None,
        }
    }

    // ============================================================
    // Daily translation quota
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_new_day_restarts_the_count_at_one(pool: MySqlPool) -> sqlx::Result<()> {
        let users = UserRepository::new(pool);

        // maria exhausted yesterday's quota
        let decision = users.consume_translation(&1, TODAY, LIMIT).await?;
        assert_eq!(decision, QuotaDecision::Allowed { remaining: 14 });

        let maria = users.read(&1).await?.expect("maria is in the fixtures");
        assert_eq!(maria.daily_translation_count, 1);
        assert_eq!(maria.last_translation_date, TODAY);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_sixteenth_translation_of_the_day_is_refused(pool: MySqlPool) -> sqlx::Result<()> {
        let users = UserRepository::new(pool);

        // pierre is at 14, the 15th goes through
        let decision = users.consume_translation(&2, TODAY, LIMIT).await?;
        assert_eq!(decision, QuotaDecision::Allowed { remaining: 0 });

        let decision = users.consume_translation(&2, TODAY, LIMIT).await?;
        assert_eq!(decision, QuotaDecision::Exceeded);

        let pierre = users.read(&2).await?.expect("pierre is in the fixtures");
        assert_eq!(pierre.daily_translation_count, LIMIT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_concurrent_consumers_share_one_limit(pool: MySqlPool) -> sqlx::Result<()> {
        let users = std::sync::Arc::new(UserRepository::new(pool));

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let users = users.clone();
                tokio::spawn(async move { users.consume_translation(&3, TODAY, LIMIT).await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.expect("task panicked")?.is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, LIMIT);

        let john = users.read(&3).await?.expect("john is in the fixtures");
        assert_eq!(john.daily_translation_count, LIMIT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_zero_limit_never_consumes(pool: MySqlPool) -> sqlx::Result<()> {
        let users = UserRepository::new(pool);

        let decision = users.consume_translation(&3, TODAY, 0).await?;
        assert_eq!(decision, QuotaDecision::Exceeded);
        let john = users.read(&3).await?.expect("john is in the fixtures");
        assert_eq!(john.daily_translation_count, 0);
        Ok(())
    }

    // ============================================================
    // Messages
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_translation_is_refused_after_an_edit(pool: MySqlPool) -> sqlx::Result<()> {
        let messages = MessageRepository::new(pool);
        let created = messages.create(&text_message(1, 2, "hello")).await?;

        messages
            .update(
                &created.message_id,
                &UpdateMessageDTO {
                    common_text: Some("hello again".to_string()),
                    sender_text: Some(String::new()),
                    receiver_text: Some(String::new()),
                },
            )
            .await?;

        // computed from the old text
        let stale = messages
            .set_translation(&created.message_id, TranslationSide::Receiver, "bonjour", Some("hello"))
            .await?;
        assert!(stale.is_none());

        let fresh = messages
            .set_translation(
                &created.message_id,
                TranslationSide::Receiver,
                "bonjour encore",
                Some("hello again"),
            )
            .await?
            .expect("text unchanged since the read");
        assert_eq!(fresh.receiver_text.as_deref(), Some("bonjour encore"));
        assert_eq!(fresh.sender_text.as_deref(), Some(""));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_media_only_message_matches_a_missing_text(pool: MySqlPool) -> sqlx::Result<()> {
        let messages = MessageRepository::new(pool);
        let created = messages
            .create(&CreateMessageDTO {
                sender_id: 1,
                receiver_id: 2,
                common_text: None,
                image: Some("https://cdn.example.com/cat.png".to_string()),
                audio: None,
            })
            .await?;

        let stored = messages
            .set_translation(&created.message_id, TranslationSide::Sender, "", None)
            .await?;
        assert!(stored.is_some());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_created_messages_come_back_in_insert_order(pool: MySqlPool) -> sqlx::Result<()> {
        let messages = MessageRepository::new(pool);
        let first = messages.create(&text_message(1, 2, "one")).await?;
        let second = messages.create(&text_message(2, 1, "two")).await?;
        let third = messages.create(&text_message(1, 2, "three")).await?;

        assert!(first.created_at <= second.created_at);
        assert!(second.created_at <= third.created_at);

        let conversation = messages.find_conversation(&2, &1).await?;
        let ids: Vec<i32> = conversation.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![first.message_id, second.message_id, third.message_id]);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "messages")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_clearing_removes_both_directions_only(pool: MySqlPool) -> sqlx::Result<()> {
        let messages = MessageRepository::new(pool);

        let deleted = messages.delete_conversation(&2, &1).await?;
        assert_eq!(deleted, 2);

        assert!(messages.find_conversation(&1, &2).await?.is_empty());
        let other = messages.find_conversation(&1, &3).await?;
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].common_text.as_deref(), Some("Hello John"));

        // nothing left to clear
        assert_eq!(messages.delete_conversation(&1, &2).await?, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "messages")))]
    #[ignore = "needs a MySQL server at DATABASE_URL"]
    async fn test_delete_reports_a_missing_message(pool: MySqlPool) -> sqlx::Result<()> {
        let messages = MessageRepository::new(pool);

        assert!(messages.delete(&1).await?);
        assert!(!messages.delete(&1).await?);
        assert!(messages.read(&1).await?.is_none());
        Ok(())
    }
}
