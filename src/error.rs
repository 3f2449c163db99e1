//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{dto::ws::ServerMessage, game::modes::RejectReason};

/// Failures surfaced to clients, over HTTP or as a wire `error` message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No room is registered under the given code.
    #[error("room {0} not found")]
    RoomNotFound(String),
    /// The room is at its player capacity.
    #[error("room is full")]
    RoomFull,
    /// The session token matches no seat in the room.
    #[error("unknown or expired session")]
    UnknownSession,
    /// The seat is already held by a live connection.
    #[error("seat is already connected")]
    SeatTaken,
    /// Only the host may perform this action.
    #[error("only the host can do that")]
    NotHost,
    /// The action does not fit the room's current phase.
    #[error("action not available in the {0} phase")]
    BadPhase(&'static str),
    /// The referenced player is not in the room.
    #[error("player not found")]
    PlayerNotFound,
    /// Spectators cannot perform gameplay actions.
    #[error("you are not seated on a team")]
    NotSeated,
    /// No round result is currently open to dispute.
    #[error("nothing to dispute")]
    NothingToDispute,
    /// Both teams need at least one ready player to start.
    #[error("both teams need ready players")]
    TeamsNotReady,
    /// The first message on a socket must bind it to a room.
    #[error("first message must create, join, or rejoin a room")]
    BindExpected,
    /// A payload failed validation.
    #[error("invalid payload: {0}")]
    Validation(#[from] validator::ValidationErrors),
    /// The active mode refused the submission.
    #[error(transparent)]
    Reject(#[from] RejectReason),
}

impl ServiceError {
    /// Stable machine-readable code for the wire `error` message.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::RoomNotFound(_) => "room-not-found",
            ServiceError::RoomFull => "room-full",
            ServiceError::UnknownSession => "unknown-session",
            ServiceError::SeatTaken => "seat-taken",
            ServiceError::NotHost => "not-host",
            ServiceError::BadPhase(_) => "bad-phase",
            ServiceError::PlayerNotFound => "player-not-found",
            ServiceError::NotSeated => "not-seated",
            ServiceError::NothingToDispute => "nothing-to-dispute",
            ServiceError::TeamsNotReady => "teams-not-ready",
            ServiceError::BindExpected => "bind-expected",
            ServiceError::Validation(_) => "invalid-payload",
            ServiceError::Reject(_) => "rejected",
        }
    }

    /// Wire form pushed to the offending socket.
    pub fn to_message(&self) -> ServerMessage {
        match self {
            // Mode rejections keep their dedicated shape.
            ServiceError::Reject(reason) => ServerMessage::Rejected { reason: *reason },
            other => ServerMessage::Error {
                code: other.code().to_string(),
                message: other.to_string(),
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::RoomFull | ServiceError::SeatTaken => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_keep_the_dedicated_wire_shape() {
        let err = ServiceError::Reject(RejectReason::NotYourTurn);
        let wire = serde_json::to_value(err.to_message()).unwrap();
        assert_eq!(wire["type"], "game:rejected");
        assert_eq!(wire["reason"], "not-your-turn");
    }

    #[test]
    fn plain_errors_carry_code_and_message() {
        let err = ServiceError::RoomNotFound("AB2CD".into());
        let wire = serde_json::to_value(err.to_message()).unwrap();
        assert_eq!(wire["type"], "error");
        assert_eq!(wire["code"], "room-not-found");
    }
}
