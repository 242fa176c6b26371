//! WebSocket Event Handlers - events sent by connected clients

use crate::AppState;
use crate::dtos::{ClientEventDTO, MessageDTO, WsEventDTO};
use crate::ws::presence::InternalSignal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

/// Dispatches one client event. The outcome goes back on the sender's own
/// connection: the stored message on success, an error event otherwise.
/// A message sent to oneself is already delivered by the fan-out, so it gets no
/// second copy here.
#[instrument(skip(state, reply, event))]
pub async fn process_client_event(
    state: &AppState,
    user_id: i32,
    reply: &UnboundedSender<InternalSignal>,
    event: ClientEventDTO,
) {
    match event {
        ClientEventDTO::SendMessage { receiver_id, content } => {
            let signal = match state.conversation.send(user_id, receiver_id, content).await {
                Ok(message) => {
                    info!(message_id = message.message_id, "Message sent over WebSocket");
                    if message.receiver_id == user_id {
                        return;
                    }
                    InternalSignal::Deliver(Arc::new(WsEventDTO::NewMessage(MessageDTO::from(message))))
                }
                Err(e) => {
                    warn!(error = %e, "Message rejected");
                    InternalSignal::Error {
                        code: e.status().as_u16(),
                        message: e.message(),
                    }
                }
            };
            let _ = reply.send(signal);
        }
    }
}
