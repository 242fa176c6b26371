//! Translation Gateway - quota-checked, failure-tolerant access to the translator

use super::translator::{TranslationError, Translator};
use crate::dtos::TranslationStatsDTO;
use crate::entities::{QuotaDecision, User};
use crate::repositories::UserStore;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Translation attempts allowed per user per calendar day.
pub const DAILY_TRANSLATION_LIMIT: i32 = 15;

/// Current calendar day (server local time) as stored in `last_translation_date`.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Upper bound for one translator call, slower calls count as failures.
    pub timeout: Duration,
    pub daily_limit: i32,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            daily_limit: DAILY_TRANSLATION_LIMIT,
        }
    }
}

/// What happened when a message was translated on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Translation disabled or preferred language is the default one.
    Skipped,
    QuotaExceeded,
    /// Quota consumed but the translator failed or timed out.
    Failed,
    Translated(String),
}

pub struct TranslationGateway {
    translator: Arc<dyn Translator>,
    users: Arc<dyn UserStore>,
    options: GatewayOptions,
}

impl TranslationGateway {
    pub fn new(translator: Arc<dyn Translator>, users: Arc<dyn UserStore>, options: GatewayOptions) -> Self {
        Self {
            translator,
            users,
            options,
        }
    }

    pub fn daily_limit(&self) -> i32 {
        self.options.daily_limit
    }

    /// Takes one translation slot from `user_id`'s daily quota.
    ///
    /// The store performs roll-over, check and increment as one atomic step per
    /// user, so concurrent callers can never both take the last slot.
    /// A consumed slot is not given back if the following translation fails.
    #[instrument(skip(self))]
    pub async fn check_and_consume_quota(&self, user_id: i32) -> Result<QuotaDecision, sqlx::Error> {
        let decision = self
            .users
            .consume_translation(&user_id, &today(), self.options.daily_limit)
            .await?;
        match decision {
            QuotaDecision::Allowed { remaining } => debug!(remaining, "Translation slot consumed"),
            QuotaDecision::Exceeded => info!("Daily translation limit exceeded"),
        }
        Ok(decision)
    }

    /// Calls the translator with a timeout. Every failure is logged and
    /// reported as `None`; callers leave the translation unset.
    #[instrument(skip(self, text), fields(target_language = %target_language))]
    pub async fn translate(&self, text: &str, target_language: &str) -> Option<String> {
        let result = match timeout(self.options.timeout, self.translator.translate(text, target_language)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::Timeout),
        };
        match result {
            Ok(translated) if !translated.trim().is_empty() => Some(translated),
            Ok(_) => {
                warn!("Translator returned an empty text");
                None
            }
            Err(e) => {
                warn!(error = %e, "Translation failed");
                None
            }
        }
    }

    /// Eager translation of `text` for `user`: eligibility, quota, then the call.
    #[instrument(skip(self, user, text), fields(user_id = user.user_id))]
    pub async fn translate_for(&self, user: &User, text: &str) -> TranslationOutcome {
        if !user.wants_translation() {
            return TranslationOutcome::Skipped;
        }
        match self.check_and_consume_quota(user.user_id).await {
            Ok(QuotaDecision::Allowed { .. }) => {}
            Ok(QuotaDecision::Exceeded) => return TranslationOutcome::QuotaExceeded,
            Err(e) => {
                warn!(error = ?e, "Quota check failed, skipping translation");
                return TranslationOutcome::Failed;
            }
        }
        match self.translate(text, &user.preferred_language).await {
            Some(translated) => TranslationOutcome::Translated(translated),
            None => TranslationOutcome::Failed,
        }
    }

    /// Usage for today, persisting the day roll-over if the counter was stale.
    pub async fn stats(&self, user_id: i32) -> Result<TranslationStatsDTO, sqlx::Error> {
        let today = today();
        let user = self.users.roll_translation_day(&user_id, &today).await?;
        Ok(TranslationStatsDTO {
            daily_translation_count: user.daily_translation_count,
            remaining_translations: user.remaining_translations(&today, self.options.daily_limit),
            translation_enabled: user.translation_enabled,
            preferred_language: user.preferred_language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::{CreateUserDTO, UpdateTranslationSettingsDTO};
    use crate::repositories::InMemoryUserRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Upper {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _target: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }
    }

    struct Slow;

    #[async_trait]
    impl Translator for Slow {
        async fn translate(&self, text: &str, _target: &str) -> Result<String, TranslationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(text.to_string())
        }
    }

    async fn spanish_user(users: &InMemoryUserRepository) -> User {
        let user = users
            .create(&CreateUserDTO {
                username: "maria".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        users
            .update_translation_settings(
                &user.user_id,
                &UpdateTranslationSettingsDTO {
                    translation_enabled: Some(true),
                    preferred_language: Some("Spanish".to_string()),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn translate_for_consumes_one_slot() {
        let users = Arc::new(InMemoryUserRepository::new());
        let user = spanish_user(&users).await;
        let translator = Arc::new(Upper { calls: AtomicUsize::new(0) });
        let gateway = TranslationGateway::new(translator.clone(), users.clone(), GatewayOptions::default());

        let outcome = gateway.translate_for(&user, "hello").await;
        assert_eq!(outcome, TranslationOutcome::Translated("HELLO".to_string()));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
        let stored = users.read(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.daily_translation_count, 1);
    }

    #[tokio::test]
    async fn disabled_users_are_skipped_without_quota() {
        let users = Arc::new(InMemoryUserRepository::new());
        let mut user = spanish_user(&users).await;
        user.translation_enabled = false;
        let translator = Arc::new(Upper { calls: AtomicUsize::new(0) });
        let gateway = TranslationGateway::new(translator.clone(), users.clone(), GatewayOptions::default());

        assert_eq!(gateway.translate_for(&user, "hello").await, TranslationOutcome::Skipped);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
        let stored = users.read(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.daily_translation_count, 0);
    }

    #[tokio::test]
    async fn timeout_is_a_failure_that_still_burns_the_slot() {
        let users = Arc::new(InMemoryUserRepository::new());
        let user = spanish_user(&users).await;
        let options = GatewayOptions {
            timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let gateway = TranslationGateway::new(Arc::new(Slow), users.clone(), options);

        assert_eq!(gateway.translate_for(&user, "hello").await, TranslationOutcome::Failed);
        let stored = users.read(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.daily_translation_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_never_exceed_the_limit() {
        let users = Arc::new(InMemoryUserRepository::new());
        let user = spanish_user(&users).await;
        let gateway = Arc::new(TranslationGateway::new(
            Arc::new(Upper { calls: AtomicUsize::new(0) }),
            users.clone(),
            GatewayOptions::default(),
        ));

        let user_id = user.user_id;
        let handles: Vec<_> = (0..40)
            .map(|_| {
                let gateway = gateway.clone();
                tokio::spawn(async move { gateway.check_and_consume_quota(user_id).await.unwrap() })
            })
            .collect();
        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, DAILY_TRANSLATION_LIMIT);
    }

    #[tokio::test]
    async fn stats_report_remaining_slots() {
        let users = Arc::new(InMemoryUserRepository::new());
        let user = spanish_user(&users).await;
        let gateway = TranslationGateway::new(
            Arc::new(Upper { calls: AtomicUsize::new(0) }),
            users.clone(),
            GatewayOptions::default(),
        );
        gateway.check_and_consume_quota(user.user_id).await.unwrap();

        let stats = gateway.stats(user.user_id).await.unwrap();
        assert_eq!(stats.daily_translation_count, 1);
        assert_eq!(stats.remaining_translations, DAILY_TRANSLATION_LIMIT - 1);
        assert!(stats.translation_enabled);
        assert_eq!(stats.preferred_language, "Spanish");
    }
}
