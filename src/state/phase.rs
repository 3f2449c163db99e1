//! Room lifecycle state machine.
//!
//! Transitions are a pure function of the current phase and an event, so
//! the table below is the single place that decides what a room may do
//! next. Anything not listed is an invalid transition.

use serde::Serialize;

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// Players gather, pick teams, and the host tunes the config.
    Lobby,
    /// Team-reveal sequence before round one.
    VsIntro,
    /// Mode roulette / host pick window.
    ModeSelect,
    /// A round is being played.
    Active,
    /// Round result on display; disputes may open.
    Result,
    /// A dispute vote is running.
    Dispute,
    /// The match is over; the host can start a rematch.
    Ended,
}

impl RoomPhase {
    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            RoomPhase::Lobby => "lobby",
            RoomPhase::VsIntro => "vs_intro",
            RoomPhase::ModeSelect => "mode_select",
            RoomPhase::Active => "active",
            RoomPhase::Result => "result",
            RoomPhase::Dispute => "dispute",
            RoomPhase::Ended => "ended",
        }
    }
}

/// Events that can move a room between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Host started (or restarted) the match.
    StartRequested,
    /// The vs-intro sequence finished.
    IntroFinished,
    /// A mode was locked in for the next round.
    ModeChosen,
    /// The active round resolved.
    RoundResolved,
    /// A dispute opened against the displayed result.
    DisputeOpened,
    /// The open dispute settled.
    DisputeSettled,
    /// The result window elapsed with more rounds to play.
    NextRound,
    /// The match ended (knockout or bag exhausted).
    MatchOver,
    /// Everyone left or the host reset the room.
    Reset,
}

/// Next phase for `(phase, event)`, or `None` when the event is invalid in
/// that phase.
pub fn compute_transition(phase: RoomPhase, event: PhaseEvent) -> Option<RoomPhase> {
    use PhaseEvent::*;
    use RoomPhase::*;

    match (phase, event) {
        (Lobby, StartRequested) => Some(VsIntro),
        (VsIntro, IntroFinished) => Some(ModeSelect),
        (ModeSelect, ModeChosen) => Some(Active),
        (Active, RoundResolved) => Some(Result),
        (Result, DisputeOpened) => Some(Dispute),
        (Result, NextRound) => Some(ModeSelect),
        (Result, MatchOver) => Some(Ended),
        (Dispute, DisputeSettled) => Some(Result),
        (Ended, StartRequested) => Some(VsIntro),
        (_, Reset) => Some(Lobby),
        _ => None,
    }
}
