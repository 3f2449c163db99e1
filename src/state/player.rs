//! Per-player state held inside a room.

use std::time::Instant;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{dto::room::PlayerSummary, dto::ws::ServerMessage, game::TeamSide};

/// Outbound half of a player's socket.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Socket liveness of a seat.
#[derive(Debug)]
pub enum Connection {
    /// Live socket; messages are pushed through the sender.
    Online(Outbound),
    /// Socket gone; the seat survives until the grace expires.
    Offline {
        /// When the socket dropped.
        since: Instant,
    },
}

/// One player in a room, connected or within their reconnect grace.
#[derive(Debug)]
pub struct Player {
    /// Stable identity, also the key in the room's player map.
    pub id: Uuid,
    /// Display name, trimmed.
    pub name: String,
    /// Secret the client presents to reclaim this seat after a disconnect.
    pub session_token: Uuid,
    /// Seat; `None` for spectators.
    pub team: Option<TeamSide>,
    /// Lobby ready flag.
    pub ready: bool,
    /// Socket state.
    pub connection: Connection,
}

impl Player {
    /// Create a freshly connected player with a new session token.
    pub fn new(name: String, team: Option<TeamSide>, out: Outbound) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            session_token: Uuid::new_v4(),
            team,
            ready: false,
            connection: Connection::Online(out),
        }
    }

    /// Whether the player's socket is live.
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Online(_))
    }

    /// Push a message to the player, silently dropping it when offline or
    /// when the socket just closed under us.
    pub fn send(&self, message: ServerMessage) {
        if let Connection::Online(out) = &self.connection {
            let _ = out.send(message);
        }
    }

    /// Client-safe projection.
    pub fn summary(&self, host: Uuid) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            team: self.team,
            ready: self.ready,
            connected: self.is_connected(),
            host: self.id == host,
        }
    }
}
