//! Client-safe projections of room state.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    game::{GameConfig, TeamSide, modes::ModePublic, scoring::Scoreboard},
    state::phase::RoomPhase,
};

/// Full client-safe state of a room, broadcast after every change a client
/// can observe. Never contains answer keys or sealed submissions.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    /// Room code.
    pub code: String,
    /// Lifecycle phase.
    pub phase: RoomPhase,
    /// Current host.
    pub host: Uuid,
    /// Everyone in the room, join order preserved.
    pub players: Vec<PlayerSummary>,
    /// Match configuration (live in the lobby, frozen once started).
    pub config: GameConfig,
    /// Health and streaks, present once a match started.
    pub board: Option<Scoreboard>,
    /// The round in flight, if any.
    pub round: Option<ActiveRound>,
    /// Milliseconds left on the current phase window, if one is armed.
    pub deadline_ms: Option<u64>,
}

/// One player as the room sees them.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    /// Stable player id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Seat; `None` for spectators.
    pub team: Option<TeamSide>,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the player's socket is live.
    pub connected: bool,
    /// Whether this player is the host.
    pub host: bool,
}

/// The in-flight round as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveRound {
    /// 1-based round number.
    pub number: u32,
    /// Mode-specific public view.
    pub view: ModePublic,
}
