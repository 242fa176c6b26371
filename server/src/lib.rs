//! Server library - exposes the main modules, also used by the integration tests

pub mod conversation;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod translation;
pub mod ws;

pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{any, delete, get, patch, post, put},
};
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .nest("/messages", configure_message_routes(state.clone()))
        .nest("/translation", configure_translation_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .with_state(state)
}

/// Login and registration, no token required
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
}

fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/users", get(list_users_for_sidebar))
        .route("/send/{receiver_id}", post(send_message))
        .route("/edit/{message_id}", patch(edit_message))
        .route("/delete/{message_id}", delete(delete_message))
        .route("/clear", delete(clear_conversation))
        .route("/update-receiver-text", post(update_receiver_text))
        .route("/update-sender-text", post(update_sender_text))
        .route("/{user_id}", get(get_messages))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_translation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/translate", post(translate_text))
        .route("/stats", get(get_translation_stats))
        .route("/settings", put(update_translation_settings))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
