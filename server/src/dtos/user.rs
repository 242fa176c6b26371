//! User DTOs - Data Transfer Objects for users

use crate::entities::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

// struct exchanged with the client, never carries the password
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDTO {
    pub id: i32,
    pub username: String,
    pub translation_enabled: bool,
    pub preferred_language: String,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            username: value.username,
            translation_enabled: value.translation_enabled,
            preferred_language: value.preferred_language,
        }
    }
}

/// DTO to create a new user (without user_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// DTO for login (username and password only)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDTO {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponseDTO {
    pub token: String,
    pub user: UserDTO,
}
