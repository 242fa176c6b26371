//! User entity - password helpers and the daily translation quota rules

use bcrypt::{DEFAULT_COST, hash, verify};
use serde::{Deserialize, Serialize};

/// Language every message is assumed to be written in; users preferring it never
/// get an automatic translation.
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub password: String,
    pub translation_enabled: bool,
    pub preferred_language: String,
    pub daily_translation_count: i32,
    /// Day the counter refers to, formatted `YYYY-MM-DD`. Empty if never used.
    pub last_translation_date: String,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with default cost
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, DEFAULT_COST)?;
        Ok(hash)
    }

    /// Whether messages should be translated eagerly for this user.
    pub fn wants_translation(&self) -> bool {
        self.translation_enabled && self.preferred_language != DEFAULT_LANGUAGE
    }

    /// Resets the counter when it refers to a day other than `today`.
    /// Returns true if the record changed.
    pub fn roll_translation_day(&mut self, today: &str) -> bool {
        if self.last_translation_date == today {
            return false;
        }
        self.daily_translation_count = 0;
        self.last_translation_date = today.to_string();
        true
    }

    /// Applies the day roll-over, then takes one slot if the limit allows it.
    pub fn try_consume_translation(&mut self, today: &str, daily_limit: i32) -> bool {
        self.roll_translation_day(today);
        if self.daily_translation_count >= daily_limit {
            return false;
        }
        self.daily_translation_count += 1;
        true
    }

    /// Slots still available today, without mutating the record.
    pub fn remaining_translations(&self, today: &str, daily_limit: i32) -> i32 {
        let used = if self.last_translation_date == today {
            self.daily_translation_count
        } else {
            0
        };
        (daily_limit - used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(count: i32, date: &str) -> User {
        User {
            user_id: 1,
            username: "alice".to_string(),
            password: String::new(),
            translation_enabled: true,
            preferred_language: "Spanish".to_string(),
            daily_translation_count: count,
            last_translation_date: date.to_string(),
        }
    }

    #[test]
    fn exhausted_counter_from_yesterday_is_reset_before_consuming() {
        let mut u = user(15, "2024-03-09");
        assert!(u.try_consume_translation("2024-03-10", 15));
        assert_eq!(u.daily_translation_count, 1);
        assert_eq!(u.last_translation_date, "2024-03-10");
    }

    #[test]
    fn sixteen_attempts_on_a_fresh_day_allow_exactly_fifteen() {
        let mut u = user(0, "");
        let allowed = (0..16)
            .filter(|_| u.try_consume_translation("2024-03-10", 15))
            .count();
        assert_eq!(allowed, 15);
        assert_eq!(u.daily_translation_count, 15);
    }

    #[test]
    fn refused_attempt_does_not_touch_the_counter() {
        let mut u = user(15, "2024-03-10");
        assert!(!u.try_consume_translation("2024-03-10", 15));
        assert_eq!(u.daily_translation_count, 15);
    }

    #[test]
    fn remaining_ignores_counts_from_other_days() {
        assert_eq!(user(12, "2024-03-10").remaining_translations("2024-03-10", 15), 3);
        assert_eq!(user(12, "2024-03-09").remaining_translations("2024-03-10", 15), 15);
    }

    #[test]
    fn english_speakers_are_never_translated_eagerly() {
        let mut u = user(0, "");
        u.preferred_language = DEFAULT_LANGUAGE.to_string();
        assert!(!u.wants_translation());
        u.preferred_language = "French".to_string();
        u.translation_enabled = false;
        assert!(!u.wants_translation());
    }
}
