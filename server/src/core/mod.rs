//! Core Module - infrastructure shared by the whole application
//!
//! - JWT authentication
//! - configuration
//! - error handling
//! - application state

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt};
pub use config::{Config, StorageBackend};
pub use error::AppError;
pub use state::AppState;
