//! Application State - shared by every route, middleware and WebSocket task

use crate::conversation::ConversationService;
use crate::repositories::{
    InMemoryMessageRepository, InMemoryUserRepository, MessageRepository, MessageStore, UserRepository,
    UserStore,
};
use crate::translation::{GatewayOptions, TranslationGateway, Translator};
use crate::ws::{DeliveryFanout, PresenceRegistry};
use sqlx::MySqlPool;
use std::sync::Arc;

pub struct AppState {
    pub user: Arc<dyn UserStore>,

    pub msg: Arc<dyn MessageStore>,

    /// Secret key for JWT tokens
    pub jwt_secret: String,

    /// Users holding a live WebSocket connection
    pub users_online: Arc<PresenceRegistry>,

    pub translation: Arc<TranslationGateway>,

    pub conversation: ConversationService,
}

impl AppState {
    /// State backed by MySQL through the shared connection pool.
    pub fn new(
        pool: MySqlPool,
        jwt_secret: String,
        translator: Arc<dyn Translator>,
        options: GatewayOptions,
    ) -> Self {
        Self::from_stores(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(MessageRepository::new(pool)),
            jwt_secret,
            translator,
            options,
        )
    }

    /// State backed by process memory, nothing survives a restart.
    pub fn in_memory(jwt_secret: String, translator: Arc<dyn Translator>, options: GatewayOptions) -> Self {
        Self::from_stores(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
            jwt_secret,
            translator,
            options,
        )
    }

    pub fn from_stores(
        user: Arc<dyn UserStore>,
        msg: Arc<dyn MessageStore>,
        jwt_secret: String,
        translator: Arc<dyn Translator>,
        options: GatewayOptions,
    ) -> Self {
        let users_online = Arc::new(PresenceRegistry::new());
        let translation = Arc::new(TranslationGateway::new(translator, user.clone(), options));
        let conversation = ConversationService::new(
            msg.clone(),
            user.clone(),
            translation.clone(),
            DeliveryFanout::new(users_online.clone()),
        );
        Self {
            user,
            msg,
            jwt_secret,
            users_online,
            translation,
            conversation,
        }
    }
}
