//! WebSocket Connection Management

use crate::dtos::{ClientEventDTO, WsEventDTO};
use crate::ws::presence::{ConnectionId, InternalSignal, PresenceChange};
use crate::ws::{BATCH_INTERVAL, BATCH_MAX_SIZE, RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use crate::{AppState, ws::event_handlers::process_client_event};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i32) {
    info!("WebSocket connection established");

    let (ws_tx, ws_rx) = ws.split();
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // subscribe before registering so our own Online change is seen by the writer
    let presence_rx = state.users_online.subscribe_changes();
    let connection_id = state.users_online.register(user_id, int_tx.clone());

    tokio::spawn(listen_ws(user_id, connection_id, ws_rx, int_tx, state.clone()));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx, BroadcastStream::new(presence_rx), state));
}

#[instrument(skip(websocket_tx, internal_rx, presence_changes, state))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    mut presence_changes: BroadcastStream<PresenceChange>,
    state: Arc<AppState>,
) {
    info!("Write task started");

    let mut batch: Vec<Arc<WsEventDTO>> = vec![Arc::new(WsEventDTO::OnlineUsers(
        state.users_online.online_users(),
    ))];
    let mut interval = interval(Duration::from_millis(BATCH_INTERVAL));
    interval.tick().await;

    'external: loop {
        tokio::select! {
            change = presence_changes.next() => {
                match change {
                    Some(Ok(_)) | Some(Err(BroadcastStreamRecvError::Lagged(_))) => {
                        // the snapshot is always current, so lagging only skips redundant ones
                        push_presence_snapshot(&mut batch, state.users_online.online_users());
                    }
                    None => {
                        warn!("Presence channel closed");
                        break 'external;
                    }
                }
            }

            _ = interval.tick() => {
                if !batch.is_empty() {
                    if send_batch(&mut websocket_tx, &batch).await.is_err() {
                        warn!("Failed to send batch on interval, closing connection");
                        break 'external;
                    }
                    batch.clear();
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Deliver(event)) => {
                        batch.push(event);
                        if batch.len() >= BATCH_MAX_SIZE {
                            if send_batch(&mut websocket_tx, &batch).await.is_err() {
                                warn!("Failed to send batch, closing connection");
                                break 'external;
                            }
                            info!(batch_size = batch.len(), "Batch sent");
                            batch.clear();
                        }
                    }
                    Some(InternalSignal::Error { code, message }) => {
                        warn!(code, error_message = message, "Sending error message to client");
                        batch.push(Arc::new(WsEventDTO::Error {
                            code,
                            message: message.to_string(),
                        }));
                    }
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    None => {
                        info!("Internal channel closed");
                        break 'external;
                    }
                }
            }
        }
    }

    if !batch.is_empty() {
        info!(batch_size = batch.len(), "Sending final batch before shutdown");
        let _ = send_batch(&mut websocket_tx, &batch).await;
    }
    let _ = websocket_tx.close().await;

    info!("Write task terminated");
}

/// Replaces any pending presence snapshot so a batch carries at most one.
fn push_presence_snapshot(batch: &mut Vec<Arc<WsEventDTO>>, online: Vec<i32>) {
    batch.retain(|event| !matches!(event.as_ref(), WsEventDTO::OnlineUsers(_)));
    batch.push(Arc::new(WsEventDTO::OnlineUsers(online)));
}

#[instrument(skip(websocket_tx, batch))]
async fn send_batch(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    batch: &[Arc<WsEventDTO>],
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(&batch).map_err(|e| {
        error!("Failed to serialize batch: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx
        .send(Message::Text(Utf8Bytes::from(json)))
        .await
        .map_err(|e| {
            error!("Failed to send batch through WebSocket: {:?}", e);
            e
        })
}

#[instrument(skip(websocket_rx, internal_tx, state))]
pub async fn listen_ws(
    user_id: i32,
    connection_id: ConnectionId,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEventDTO>(&text) {
                        Ok(event) => {
                            info!("Event received from client");
                            process_client_event(&state, user_id, &internal_tx, event).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to deserialize client event");
                            let _ = internal_tx.send(InternalSignal::Error {
                                code: 400,
                                message: "Malformed event",
                            });
                        }
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    info!("Cleaning up connection");
    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.users_online.unregister_connection(user_id, connection_id);
    info!("Listen task terminated");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_only_the_latest_presence_snapshot() {
        let mut batch = vec![
            Arc::new(WsEventDTO::OnlineUsers(vec![1])),
            Arc::new(WsEventDTO::MessageDeleted { message_id: 3 }),
        ];
        push_presence_snapshot(&mut batch, vec![1, 2]);

        assert_eq!(batch.len(), 2);
        assert_eq!(*batch[0], WsEventDTO::MessageDeleted { message_id: 3 });
        assert_eq!(*batch[1], WsEventDTO::OnlineUsers(vec![1, 2]));
    }
}
