//! WebSocket Module - real-time delivery to connected users
//!
//! - HTTP -> WebSocket upgrade behind the JWT middleware
//! - one reader and one writer task per connection
//! - presence registry and best-effort fan-out of conversation events

pub mod connection;
pub mod event_handlers;
pub mod fanout;
pub mod presence;

pub use connection::handle_socket;
pub use fanout::{DeliveryEvent, DeliveryFanout};
pub use presence::{ConnectionId, InternalSignal, PresenceChange, PresenceRegistry};

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Writer flushes pending events at least this often (ms).
pub const BATCH_INTERVAL: u64 = 100;
/// Writer flushes as soon as this many events are pending.
pub const BATCH_MAX_SIZE: usize = 10;
/// Minimum spacing between two processed client frames (ms).
pub const RATE_LIMITER_MILLIS: u64 = 10;
/// Idle connections are closed after this long without a client frame.
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
/// Buffered presence changes per subscriber before it starts lagging.
pub const PRESENCE_CHANNEL_CAPACITY: usize = 256;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Response {
    let user_id = current_user.user_id;
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
