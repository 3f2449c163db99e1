//! WebSocket message contracts.
//!
//! Everything on the wire is a JSON object tagged by `type`. The first
//! client message on a fresh socket must be one of `room:create`,
//! `room:join` or `room:rejoin`; everything else is only meaningful once
//! the socket is bound to a room.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::room::RoomSnapshot,
    game::{
        GameConfig, GameConfigPatch, GameMode, TeamPair, TeamSide,
        dispute::DisputeVerdict,
        modes::{ModeEvent, ModePublic, RejectReason, RevealedAnswer},
        scoring::Settlement,
    },
};

/// Payload of `room:create`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoomPayload {
    /// Display name of the creating player (becomes host).
    #[validate(custom(function = crate::dto::validation::display_name))]
    pub name: String,
    /// Optional initial tweaks to the default match configuration.
    #[serde(default)]
    pub config: Option<GameConfigPatch>,
}

/// Room role assignable through `room:move_player`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    /// Room owner; there is exactly one at a time.
    Host,
    /// Regular member.
    Guest,
}

/// Payload of `room:join`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinRoomPayload {
    /// Code of the room to join.
    #[validate(custom(function = crate::dto::validation::room_code))]
    pub code: String,
    /// Display name of the joining player.
    #[validate(custom(function = crate::dto::validation::display_name))]
    pub name: String,
}

/// Payload of `room:rejoin`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejoinPayload {
    /// Code of the room the session belongs to.
    #[validate(custom(function = crate::dto::validation::room_code))]
    pub code: String,
    /// Session token issued at the original join.
    pub session_token: Uuid,
}

/// Messages clients send to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Open a fresh room and become its host.
    #[serde(rename = "room:create")]
    CreateRoom(CreateRoomPayload),
    /// Join an existing room by code.
    #[serde(rename = "room:join")]
    JoinRoom(JoinRoomPayload),
    /// Resume a seat after a disconnect, within the grace window.
    #[serde(rename = "room:rejoin")]
    Rejoin(RejoinPayload),
    /// Leave the room for good.
    #[serde(rename = "room:leave")]
    LeaveRoom,
    /// Host only: move a player onto a team, or off to spectate.
    #[serde(rename = "room:move_player")]
    MovePlayer {
        /// Player being moved.
        player: Uuid,
        /// Destination side; `None` makes them a spectator.
        team: Option<TeamSide>,
        /// Role change; `host` hands the room over.
        #[serde(default)]
        role: Option<PlayerRole>,
    },
    /// Flip the sender's lobby ready flag.
    #[serde(rename = "room:set_ready")]
    SetReady {
        /// New ready state.
        ready: bool,
    },
    /// Host only: patch the match configuration from the lobby.
    #[serde(rename = "room:update_config")]
    UpdateConfig {
        /// Partial configuration update.
        config: GameConfigPatch,
    },
    /// Host only: leave the lobby and start the match.
    #[serde(rename = "game:start")]
    StartGame,
    /// Host only: pick the next mode while selection is open.
    #[serde(rename = "game:select_mode")]
    SelectMode {
        /// Picked mode.
        mode: GameMode,
    },
    /// Host only: abandon the current round with no winner.
    #[serde(rename = "game:skip")]
    SkipRound,
    /// Free-text gameplay submission.
    #[serde(rename = "game:submit_answer")]
    SubmitAnswer {
        /// Raw answer text.
        text: String,
    },
    /// Sealed bet for the betting mode.
    #[serde(rename = "game:submit_bet")]
    SubmitBet {
        /// Bet amount.
        amount: u32,
    },
    /// True/false vote for the mytho mode.
    #[serde(rename = "game:submit_mytho")]
    SubmitMytho {
        /// Vote value.
        value: bool,
    },
    /// Buzz press for the buzzer mode.
    #[serde(rename = "game:buzz")]
    Buzz,
    /// Contest the last round result.
    #[serde(rename = "game:request_dispute")]
    RequestDispute {
        /// Identifier from the contested `game:round_ended`.
        result_id: Uuid,
    },
    /// Vote on the open dispute.
    #[serde(rename = "game:vote_dispute")]
    VoteDispute {
        /// Accept (overturn) or reject (uphold).
        accept: bool,
    },
    /// Live-typing hint relayed to teammates only.
    #[serde(rename = "input:typing")]
    Typing {
        /// Partial text being typed.
        text: String,
    },
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Socket is bound to a room; carries the caller's identity.
    #[serde(rename = "room:welcome")]
    Welcome {
        /// Room code.
        code: String,
        /// The caller's player id.
        player_id: Uuid,
        /// Token for `room:rejoin` after a disconnect.
        session_token: Uuid,
    },
    /// Full room state, re-broadcast after every roster or phase change.
    #[serde(rename = "room:snapshot")]
    Snapshot {
        /// Current state of the room.
        snapshot: RoomSnapshot,
    },
    /// A teammate is typing.
    #[serde(rename = "input:typing")]
    Typing {
        /// Typing player.
        player: Uuid,
        /// Partial text so far.
        text: String,
    },
    /// Match opener: team rosters face off before round one.
    #[serde(rename = "game:vs_intro")]
    VsIntro {
        /// Team member names, side by side.
        teams: TeamPair<Vec<String>>,
        /// Match configuration being played.
        config: GameConfig,
    },
    /// Mode selection opened; clients animate a roulette over the options.
    #[serde(rename = "game:mode_roulette")]
    ModeRoulette {
        /// Distinct modes still in the bag.
        options: Vec<GameMode>,
        /// Whether the host picks or the server rolls.
        host_pick: bool,
    },
    /// The next round's mode is locked in.
    #[serde(rename = "game:mode_selected")]
    ModeSelected {
        /// Chosen mode.
        mode: GameMode,
    },
    /// A round began.
    #[serde(rename = "game:round_started")]
    RoundStarted {
        /// 1-based round number.
        number: u32,
        /// Client-safe view of the round state.
        view: ModePublic,
        /// Milliseconds until the play window closes.
        deadline_ms: u64,
    },
    /// Once-a-second countdown while a window is open.
    #[serde(rename = "game:timer_tick")]
    TimerTick {
        /// Milliseconds left on the current window.
        remaining_ms: u64,
    },
    /// Pixel-reveal pacing: how much of the picture is uncovered.
    #[serde(rename = "game:pixel_blur_update")]
    PixelBlurUpdate {
        /// Revealed fraction in `0.0..=1.0`.
        revealed: f32,
    },
    /// A submission bounced; sent only to the submitting player.
    #[serde(rename = "game:rejected")]
    Rejected {
        /// Machine-readable reason.
        reason: RejectReason,
    },
    /// A round settled.
    #[serde(rename = "game:round_ended")]
    RoundEnded {
        /// Identifier to reference in a dispute.
        result_id: Uuid,
        /// Mode that was played.
        mode: GameMode,
        /// Winning team, if the round had one.
        winner: Option<TeamSide>,
        /// Answer key, disclosed now.
        reveal: RevealedAnswer,
        /// Damage, health and streaks after the round.
        settlement: Settlement,
    },
    /// Mytho epilogue: both team verdicts against the truth.
    #[serde(rename = "game:mytho_result")]
    MythoResult {
        /// Verdict each team settled on.
        verdicts: TeamPair<Option<bool>>,
        /// Actual truth value.
        truth: bool,
    },
    /// A dispute opened over the last result.
    #[serde(rename = "dispute:started")]
    DisputeStarted {
        /// Contested result.
        result_id: Uuid,
        /// Player who raised it.
        challenger: Uuid,
        /// Team the dispute would hand the round to.
        challenger_team: TeamSide,
        /// Milliseconds to vote.
        deadline_ms: u64,
    },
    /// The open dispute settled.
    #[serde(rename = "dispute:resolved")]
    DisputeResolved {
        /// Tally and outcome.
        verdict: DisputeVerdict,
        /// Re-settled scores when the dispute was accepted.
        settlement: Option<Settlement>,
    },
    /// The match is over.
    #[serde(rename = "game:ended")]
    GameEnded {
        /// Match winner; `None` when the match ended level.
        winner: Option<TeamSide>,
        /// Final health totals.
        hp: TeamPair<u32>,
    },
    /// Human-readable notice (host transfers, grace expiries, ...).
    #[serde(rename = "notice")]
    Notice {
        /// Notice text.
        message: String,
    },
    /// Request-level failure on this socket.
    #[serde(rename = "error")]
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable detail.
        message: String,
    },
    /// Mode-specific mid-round progress. Untagged so each event keeps its
    /// own `type`; serde requires this variant to sit last.
    #[serde(untagged)]
    Mode(ModeEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_by_tag() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"room:join","code":"AB2CD","name":"Nina"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom(p) if p.code == "AB2CD"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"game:buzz"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Buzz));
    }

    #[test]
    fn mode_events_keep_their_own_tag() {
        let event = ModeEvent::BuzzReopened {
            eligible: TeamSide::B,
        };
        let wire = serde_json::to_value(ServerMessage::Mode(event)).unwrap();
        assert_eq!(wire["type"], "game:buzz_reopened");
        assert_eq!(wire["eligible"], "b");
    }

    #[test]
    fn rejections_serialize_the_reason_code() {
        let wire = serde_json::to_value(ServerMessage::Rejected {
            reason: RejectReason::NotYourTurn,
        })
        .unwrap();
        assert_eq!(wire["reason"], "not-your-turn");
    }
}
