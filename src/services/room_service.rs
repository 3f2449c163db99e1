//! Binding sockets to rooms: create, join, and rejoin.

use tokio::sync::oneshot;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::ws::ClientMessage,
    error::ServiceError,
    state::{
        SharedState,
        player::Outbound,
        room::{RoomHandle, RoomMessage, Welcome},
    },
};

/// Resolve the first message of a socket into a room binding.
///
/// Accepts `room:create`, `room:join` and `room:rejoin`; anything else is
/// a protocol error. Codes are case-insensitive on the way in.
pub async fn bind(
    state: &SharedState,
    message: ClientMessage,
    out: Outbound,
) -> Result<(RoomHandle, Welcome), ServiceError> {
    match message {
        ClientMessage::CreateRoom(payload) => {
            payload.validate()?;
            let handle = state.registry.create_room();
            let welcome = join(&handle, payload.name, out).await?;
            // The creator is the host, so the initial config applies as a
            // regular lobby update.
            if let Some(config) = payload.config {
                handle.send(RoomMessage::Client {
                    player: welcome.player_id,
                    message: ClientMessage::UpdateConfig { config },
                });
            }
            Ok((handle, welcome))
        }
        ClientMessage::JoinRoom(mut payload) => {
            payload.code = payload.code.trim().to_ascii_uppercase();
            payload.validate()?;
            let handle = state
                .registry
                .get(&payload.code)
                .ok_or_else(|| ServiceError::RoomNotFound(payload.code.clone()))?;
            let welcome = join(&handle, payload.name, out).await?;
            Ok((handle, welcome))
        }
        ClientMessage::Rejoin(mut payload) => {
            payload.code = payload.code.trim().to_ascii_uppercase();
            payload.validate()?;
            let handle = state
                .registry
                .get(&payload.code)
                .ok_or_else(|| ServiceError::RoomNotFound(payload.code.clone()))?;
            let welcome = rejoin(&handle, payload.session_token, out).await?;
            Ok((handle, welcome))
        }
        _ => Err(ServiceError::BindExpected),
    }
}

async fn join(handle: &RoomHandle, name: String, out: Outbound) -> Result<Welcome, ServiceError> {
    let (reply, answer) = oneshot::channel();
    if !handle.send(RoomMessage::Join { name, out, reply }) {
        return Err(ServiceError::RoomNotFound(handle.code.clone()));
    }
    answer
        .await
        .map_err(|_| ServiceError::RoomNotFound(handle.code.clone()))?
}

async fn rejoin(
    handle: &RoomHandle,
    session_token: Uuid,
    out: Outbound,
) -> Result<Welcome, ServiceError> {
    let (reply, answer) = oneshot::channel();
    if !handle.send(RoomMessage::Rejoin {
        session_token,
        out,
        reply,
    }) {
        return Err(ServiceError::RoomNotFound(handle.code.clone()));
    }
    answer
        .await
        .map_err(|_| ServiceError::RoomNotFound(handle.code.clone()))?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        config::AppConfig,
        content::BuiltinLibrary,
        dto::ws::{CreateRoomPayload, JoinRoomPayload},
        state::AppState,
    };

    fn shared_state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(BuiltinLibrary::new()))
    }

    #[tokio::test]
    async fn create_then_join_by_code() {
        let state = shared_state();
        let (out, _inbox) = mpsc::unbounded_channel();
        let (handle, creator) = bind(
            &state,
            ClientMessage::CreateRoom(CreateRoomPayload {
                name: "Alice".into(),
                config: None,
            }),
            out,
        )
        .await
        .unwrap();

        let (out, _inbox) = mpsc::unbounded_channel();
        let (_, joiner) = bind(
            &state,
            ClientMessage::JoinRoom(JoinRoomPayload {
                // Codes are case-insensitive on input.
                code: handle.code.to_lowercase(),
                name: "Bob".into(),
            }),
            out,
        )
        .await
        .unwrap();
        assert_eq!(creator.code, joiner.code);
        assert_ne!(creator.player_id, joiner.player_id);
    }

    #[tokio::test]
    async fn join_unknown_room_fails() {
        let state = shared_state();
        let (out, _inbox) = mpsc::unbounded_channel();
        let err = bind(
            &state,
            ClientMessage::JoinRoom(JoinRoomPayload {
                code: "AB2CD".into(),
                name: "Bob".into(),
            }),
            out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn gameplay_message_cannot_bind() {
        let state = shared_state();
        let (out, _inbox) = mpsc::unbounded_channel();
        let err = bind(&state, ClientMessage::Buzz, out).await.unwrap_err();
        assert!(matches!(err, ServiceError::BindExpected));
    }

    #[tokio::test]
    async fn short_names_fail_validation() {
        let state = shared_state();
        let (out, _inbox) = mpsc::unbounded_channel();
        let err = bind(
            &state,
            ClientMessage::CreateRoom(CreateRoomPayload {
                name: "x".into(),
                config: None,
            }),
            out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
