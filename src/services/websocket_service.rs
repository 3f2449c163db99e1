//! WebSocket lifecycle: writer task, identification, and the read loop.
//!
//! A socket is anonymous until its first text frame binds it to a room
//! (`room:create` / `room:join` / `room:rejoin`). Outbound traffic runs
//! through an unbounded channel drained by a dedicated writer task so the
//! room actor never blocks on a slow client.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::ServiceError,
    services::room_service,
    state::{
        SharedState,
        player::Outbound,
        room::{RoomHandle, RoomMessage, Welcome},
    },
};

/// How long a fresh socket gets to send its binding message.
const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Drive one client socket from accept to close.
pub async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sink, mut stream) = socket.split();

    let (out, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            match serde_json::to_string(&message) {
                Ok(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "dropping unserializable message"),
            }
        }
        let _ = sink.close().await;
    });

    if let Some((handle, welcome)) = identify(&mut stream, &state, &out).await {
        read_loop(&mut stream, &handle, &welcome, &out).await;
        handle.send(RoomMessage::Disconnected {
            player: welcome.player_id,
        });
    }

    // Closing the outbox ends the writer.
    drop(out);
    let _ = writer.await;
}

/// Wait for the binding message and resolve it into a room seat.
async fn identify(
    stream: &mut SplitStream<WebSocket>,
    state: &SharedState,
    out: &Outbound,
) -> Option<(RoomHandle, Welcome)> {
    let first = tokio::time::timeout(IDENT_TIMEOUT, async {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) | Err(_) => return None,
                // Pings are answered by axum; anything else is ignored.
                Ok(_) => {}
            }
        }
        None
    })
    .await;

    let text = match first {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(_) => {
            debug!("socket never identified, closing");
            let _ = out.send(ServiceError::BindExpected.to_message());
            return None;
        }
    };

    let message = match serde_json::from_str::<ClientMessage>(&text) {
        Ok(message) => message,
        Err(err) => {
            let _ = out.send(ServerMessage::Error {
                code: "bad-message".into(),
                message: err.to_string(),
            });
            return None;
        }
    };

    match room_service::bind(state, message, out.clone()).await {
        Ok(bound) => Some(bound),
        Err(err) => {
            let _ = out.send(err.to_message());
            None
        }
    }
}

/// Forward frames from a bound socket into its room until it closes.
async fn read_loop(
    stream: &mut SplitStream<WebSocket>,
    handle: &RoomHandle,
    welcome: &Welcome,
    out: &Outbound,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => {
                    let delivered = handle.send(RoomMessage::Client {
                        player: welcome.player_id,
                        message,
                    });
                    if !delivered {
                        // Room got reaped under us.
                        break;
                    }
                }
                Err(err) => {
                    let _ = out.send(ServerMessage::Error {
                        code: "bad-message".into(),
                        message: err.to_string(),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(error = %err, "socket errored");
                break;
            }
        }
    }
}
