//! Call audio WebSocket handler
//!
//! One connection per phone call, addressed by the `callSid` query
//! parameter. The handler owns the socket; the session holds a sender-side
//! `Transport` handle so teardown from the store or the sweep can close the
//! connection without reaching into this task.
//!
//! Close codes: 1008 for a missing or malformed call id, 1013 when the
//! session ceiling is reached.

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::session::{SessionState, Transport, TransportMessage};
use crate::errors::SessionError;
use crate::state::AppState;

use super::messages::{AudioFrame, OutgoingMessage};

/// Channel buffer between the read loop and the socket writer task.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket message size (1 MB); audio frames are small JSON
/// payloads, anything larger is malformed.
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Policy violation: missing or malformed call id.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Try again later: concurrent session ceiling reached.
const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    #[serde(rename = "callSid")]
    pub call_sid: Option<String>,
}

/// Call stream WebSocket handler.
///
/// Upgrades the HTTP connection and hands the socket to the session loop.
/// Rejections (missing call id, capacity) happen after the upgrade so the
/// client receives a meaningful close code rather than a failed handshake.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!(call_sid = ?query.call_sid, "stream WebSocket upgrade requested");

    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_stream_socket(socket, state, query.call_sid))
}

async fn handle_stream_socket(socket: WebSocket, state: Arc<AppState>, call_sid: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<TransportMessage>(CHANNEL_BUFFER_SIZE);

    // Writer task: the only place that touches the socket's sink.
    let sender_task = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            let should_close = matches!(
                message,
                TransportMessage::Close | TransportMessage::CloseWith { .. }
            );

            let result = match message {
                TransportMessage::Text(payload) => sender.send(Message::Text(payload.into())).await,
                TransportMessage::Ping => sender.send(Message::Ping(bytes::Bytes::new())).await,
                TransportMessage::Close => sender.send(Message::Close(None)).await,
                TransportMessage::CloseWith { code, reason } => {
                    sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await
                }
            };

            if let Err(e) = result {
                debug!(error = %e, "WebSocket send failed, writer exiting");
                break;
            }
            if should_close {
                break;
            }
        }
    });

    let transport = Transport::new(message_tx.clone());

    let Some(call_id) = call_sid else {
        warn!("rejecting stream connection without callSid");
        let _ = message_tx
            .send(TransportMessage::CloseWith {
                code: CLOSE_POLICY_VIOLATION,
                reason: "callSid query parameter is required".to_string(),
            })
            .await;
        let _ = sender_task.await;
        return;
    };

    let session = match state.controller.register(&call_id, transport.clone()).await {
        Ok(session) => {
            info!(call_id = %call_id, "stream session registered");
            session
        }
        Err(e) => {
            let (code, reason) = match &e {
                SessionError::CapacityExceeded => {
                    (CLOSE_TRY_AGAIN_LATER, "server is at capacity".to_string())
                }
                SessionError::Validation(message) => (CLOSE_POLICY_VIOLATION, message.clone()),
                other => (CLOSE_POLICY_VIOLATION, other.to_string()),
            };
            warn!(call_id = %call_id, %reason, "rejecting stream connection");
            let _ = message_tx
                .send(TransportMessage::CloseWith { code, reason })
                .await;
            let _ = sender_task.await;
            return;
        }
    };

    // Liveness pings; pongs refresh the session's activity timestamp.
    let heartbeat_transport = transport.clone();
    let heartbeat_interval = state.controller.config().heartbeat_interval();
    let heartbeat_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !heartbeat_transport.send(TransportMessage::Ping).await {
                break;
            }
        }
    });

    let mut close_reason = SessionState::Closing;

    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                process_text_frame(&state, &call_id, &transport, text.as_str()).await;
            }
            Some(Ok(Message::Binary(data))) => {
                // Some telephony bridges send JSON frames as binary
                match std::str::from_utf8(&data) {
                    Ok(text) => {
                        process_text_frame(&state, &call_id, &transport, text).await;
                    }
                    Err(_) => {
                        debug!(call_id = %call_id, "ignoring non-UTF-8 binary frame");
                    }
                }
            }
            Some(Ok(Message::Pong(_))) => {
                session.touch();
            }
            Some(Ok(Message::Ping(_))) => {
                // axum replies to pings automatically
            }
            Some(Ok(Message::Close(_))) => {
                info!(call_id = %call_id, "stream connection closed by client");
                break;
            }
            Some(Err(e)) => {
                warn!(call_id = %call_id, error = %e, "stream WebSocket error");
                close_reason = SessionState::Errored;
                break;
            }
            None => {
                info!(call_id = %call_id, "stream connection ended");
                break;
            }
        }
    }

    heartbeat_task.abort();
    state.controller.handle_disconnect(&session, close_reason).await;
    sender_task.abort();
    debug!(call_id = %call_id, "stream connection terminated");
}

/// Parse and process one inbound frame. Malformed payloads and processing
/// failures are reported to the client; neither ends the connection.
async fn process_text_frame(state: &Arc<AppState>, call_id: &str, transport: &Transport, text: &str) {
    let frame: AudioFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(call_id, error = %e, "malformed audio frame");
            send_error(transport, "Invalid audio frame").await;
            return;
        }
    };

    if frame.metadata.call_sid != call_id {
        warn!(
            call_id,
            frame_call_sid = %frame.metadata.call_sid,
            "dropping frame addressed to a different call"
        );
        return;
    }

    if let Err(e) = state.controller.process_frame(&frame).await {
        error!(call_id, error = %e, "failed to process audio frame");
        send_error(transport, "Failed to process audio").await;
    }
}

async fn send_error(transport: &Transport, message: &str) {
    let outgoing = OutgoingMessage::Error {
        message: message.to_string(),
    };
    match serde_json::to_string(&outgoing) {
        Ok(json) => {
            transport.send(TransportMessage::Text(json)).await;
        }
        Err(e) => error!(error = %e, "failed to serialize outgoing message"),
    }
}
