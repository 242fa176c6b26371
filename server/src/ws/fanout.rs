//! Delivery Fan-out - best-effort push of message events to connected peers

use crate::dtos::{MessageDTO, WsEventDTO};
use crate::entities::Message;
use crate::ws::presence::{InternalSignal, PresenceRegistry};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Events a participant is told about after the change is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryEvent {
    NewMessage(Message),
    MessageEdited(Message),
    MessageDeleted { message_id: i32 },
    ConversationCleared { user_id: i32 },
}

impl DeliveryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DeliveryEvent::NewMessage(_) => "NewMessage",
            DeliveryEvent::MessageEdited(_) => "MessageEdited",
            DeliveryEvent::MessageDeleted { .. } => "MessageDeleted",
            DeliveryEvent::ConversationCleared { .. } => "ConversationCleared",
        }
    }
}

impl From<DeliveryEvent> for WsEventDTO {
    fn from(event: DeliveryEvent) -> Self {
        match event {
            DeliveryEvent::NewMessage(m) => WsEventDTO::NewMessage(MessageDTO::from(m)),
            DeliveryEvent::MessageEdited(m) => WsEventDTO::MessageEdited(MessageDTO::from(m)),
            DeliveryEvent::MessageDeleted { message_id } => WsEventDTO::MessageDeleted { message_id },
            DeliveryEvent::ConversationCleared { user_id } => WsEventDTO::ConversationCleared { user_id },
        }
    }
}

#[derive(Clone)]
pub struct DeliveryFanout {
    presence: Arc<PresenceRegistry>,
}

impl DeliveryFanout {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// Pushes `event` to `recipient` if connected, otherwise drops it: the client
    /// re-reads the conversation on its next connect. Never waits on the socket,
    /// the connection's writer task does the actual send.
    ///
    /// One call hands the event to at most one connection.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn notify(&self, recipient: i32, event: DeliveryEvent) -> bool {
        let signal = InternalSignal::Deliver(Arc::new(WsEventDTO::from(event)));
        let delivered = self.presence.send_if_online(recipient, signal);
        debug!(delivered, "Fan-out attempted");
        delivered
    }
}
