//! Shared mode-handler contract and the eight mini-game formats.
//!
//! Each format keeps its in-progress state in a [`ModeData`] variant. The
//! round layer only talks to the dispatch methods here: validate a
//! submission, ask whether the round is over, resolve it into a
//! [`RoundResult`]. Answer keys live inside the variants and are only ever
//! exposed through [`RoundResult::reveal`]; the public projections
//! ([`ModePublic`]) are what clients see before resolution.

pub mod betting;
pub mod buzzer;
pub mod chain;
pub mod continuation;
pub mod elimination;
pub mod mytho;
pub mod reveal;
pub mod themed;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::PhaseTimers,
    content::{ArtistProfile, ContentLibrary},
    game::{GameConfig, GameMode, TeamPair, TeamSide, text::MatchPolicy},
};

pub use self::{
    betting::BettingData, buzzer::BuzzerData, chain::ChainData, continuation::ContinuationData,
    elimination::EliminationData, mytho::MythoData, reveal::RevealData, themed::ThemedData,
};

/// Reason a submission was refused. Serialized as the wire `reason` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// Acting outside the submitting team's turn or buzz lock.
    #[error("not your turn")]
    NotYourTurn,
    /// The relevant submission window is not open.
    #[error("window closed")]
    WindowClosed,
    /// The entity already submitted for this step.
    #[error("already submitted")]
    AlreadySubmitted,
    /// Blank or whitespace-only payload.
    #[error("empty submission")]
    EmptySubmission,
    /// Entry already used earlier in the round.
    #[error("entry already used")]
    Duplicate,
    /// Entry does not belong to the active theme or category.
    #[error("entry does not match the theme")]
    OffTheme,
    /// Named artist never collaborated with the chain tail.
    #[error("not a collaborator of the chain tail")]
    NotACollaborator,
    /// Guess does not name a known candidate.
    #[error("unknown entity")]
    UnknownEntity,
    /// Bet outside the accepted range.
    #[error("bet out of range")]
    BetOutOfRange,
    /// Payload type does not fit the active mode.
    #[error("unexpected payload for this mode")]
    UnexpectedPayload,
}

/// Parsed gameplay payload routed into the active mode.
#[derive(Debug, Clone)]
pub enum ModeAction {
    /// Free-text answer or list entry.
    Answer(String),
    /// Sealed numeric bet.
    Bet(u32),
    /// True/false vote.
    Vote(bool),
    /// Buzz press.
    Buzz,
}

/// Per-submission context handed to mode handlers.
pub struct SubmitCtx<'a> {
    /// Submitting player.
    pub player: Uuid,
    /// Team the player is seated on.
    pub team: TeamSide,
    /// Free-text tolerance policy.
    pub policy: &'a MatchPolicy,
    /// Phase duration table, for modes that reset their own windows.
    pub timers: &'a PhaseTimers,
    /// Connected players per team at the time of the submission.
    pub team_connected: TeamPair<usize>,
}

/// Outcome of an accepted submission.
#[derive(Debug)]
pub struct Accepted {
    /// Progress events to broadcast to the room.
    pub events: Vec<ModeEvent>,
    /// New phase deadline to arm, when the submission opened a fresh window.
    pub window: Option<Duration>,
}

impl Accepted {
    fn events(events: Vec<ModeEvent>) -> Self {
        Self {
            events,
            window: None,
        }
    }

    fn with_window(events: Vec<ModeEvent>, window: Duration) -> Self {
        Self {
            events,
            window: Some(window),
        }
    }
}

/// What happens when the current phase deadline fires.
#[derive(Debug)]
pub enum DeadlineOutcome {
    /// The round is over; resolve it with [`ResolveTrigger::Timeout`].
    Complete,
    /// The mode advanced to an inner window (bet reveal, buzz reopen, ...).
    Extended {
        /// Events describing the advancement.
        events: Vec<ModeEvent>,
        /// Duration of the new window.
        window: Duration,
    },
}

/// Why a round is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTrigger {
    /// The mode reported completion after a submission.
    Natural,
    /// The phase deadline expired.
    Timeout,
    /// The host skipped the round.
    Skipped,
}

/// Mode progress notification broadcast to the room mid-round.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ModeEvent {
    /// Chain grew or the turn flipped.
    #[serde(rename = "game:chain_update")]
    ChainUpdate {
        /// Chain so far, seed included.
        chain: Vec<chain::ChainLink>,
        /// Team now on turn.
        turn: TeamSide,
    },
    /// Turn ownership changed in a turn-based mode.
    #[serde(rename = "game:turn_update")]
    TurnUpdate {
        /// Team now on turn.
        turn: TeamSide,
        /// Remaining shared attempts, when the mode has a budget.
        attempts_left: Option<u32>,
    },
    /// A submission was judged (correct or not).
    #[serde(rename = "game:answer_result")]
    AnswerResult {
        /// Submitting player.
        player: Uuid,
        /// Their team.
        team: TeamSide,
        /// Whether the answer matched.
        correct: bool,
    },
    /// A team's hidden mytho vote count changed (values stay sealed).
    #[serde(rename = "game:mytho_vote")]
    MythoVote {
        /// Team that voted.
        team: TeamSide,
        /// Number of members who voted so far.
        votes_cast: usize,
    },
    /// Both bets are in (or the window expired); proof phase begins.
    #[serde(rename = "game:bet_revealed")]
    BetRevealed {
        /// Unsealed bets.
        bets: TeamPair<u32>,
        /// Team that must now prove its bet.
        prover: TeamSide,
        /// Items the prover committed to.
        target: u32,
    },
    /// The prover landed another valid item.
    #[serde(rename = "game:proof_progress")]
    ProofProgress {
        /// Proving team.
        team: TeamSide,
        /// Items accepted so far.
        accepted: Vec<String>,
        /// Items the prover committed to.
        target: u32,
    },
    /// A buzz locked the answer window.
    #[serde(rename = "game:buzz_result")]
    BuzzResult {
        /// Team holding the lock.
        team: TeamSide,
        /// Player who buzzed.
        player: Uuid,
    },
    /// The failed team is locked out; buzzing reopened for the other team.
    #[serde(rename = "game:buzz_reopened")]
    BuzzReopened {
        /// Only team still allowed to buzz.
        eligible: TeamSide,
    },
    /// Per-attribute feedback for an elimination guess.
    #[serde(rename = "game:attempt_feedback")]
    AttemptFeedback {
        /// The graded attempt.
        feedback: elimination::AttemptFeedback,
        /// Remaining shared attempts.
        attempts_left: u32,
    },
}

/// Settled outcome of a round, produced by `resolve` and fed to scoring.
#[derive(Debug, Clone)]
pub struct RoundResult {
    /// Identity of this result, referenced by dispute requests.
    pub id: Uuid,
    /// Format that was played.
    pub mode: GameMode,
    /// Winning team, when the round had one.
    pub winner: Option<TeamSide>,
    /// Teams that take damage this round.
    pub losers: Vec<TeamSide>,
    /// Bet size, for bet-weighted damage.
    pub bet: Option<u32>,
    /// Answer key, revealed only now.
    pub reveal: RevealedAnswer,
}

impl RoundResult {
    fn new(mode: GameMode, winner: Option<TeamSide>, reveal: RevealedAnswer) -> Self {
        let losers = winner.map(|w| vec![w.opponent()]).unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            mode,
            winner,
            losers,
            bet: None,
            reveal,
        }
    }

    fn draw(mode: GameMode, reveal: RevealedAnswer) -> Self {
        Self::new(mode, None, reveal)
    }
}

/// Answer key disclosed in a round result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RevealedAnswer {
    /// Plain text answer.
    Text(String),
    /// Truth value of a mytho claim.
    Truth(bool),
    /// Accepted item list.
    Items(Vec<String>),
    /// Full attribute sheet of the hidden artist.
    Profile(ArtistProfile),
    /// Nothing to reveal.
    None,
}

/// Tagged union of in-progress round state, one variant per format.
#[derive(Debug)]
pub enum ModeData {
    /// Collaboration chain.
    FeatChain(ChainData),
    /// Themed naming.
    ThemedList(ThemedData),
    /// True/false claim.
    Mytho(MythoData),
    /// Sealed bets and proof.
    Betting(BettingData),
    /// Buzz and answer.
    Buzzer(BuzzerData),
    /// Progressive picture reveal.
    PixelReveal(RevealData),
    /// Attribute elimination.
    Elimination(EliminationData),
    /// Lyric continuation.
    Continuation(ContinuationData),
}

impl ModeData {
    /// Pull the next content unit and build the initial round state.
    pub fn init(mode: GameMode, content: &dyn ContentLibrary, config: &GameConfig) -> Self {
        match mode {
            GameMode::FeatChain => ModeData::FeatChain(ChainData::new(content.chain_puzzle())),
            GameMode::ThemedList => ModeData::ThemedList(ThemedData::new(content.theme_puzzle())),
            GameMode::Mytho => ModeData::Mytho(MythoData::new(content.mytho_claim())),
            GameMode::Betting => ModeData::Betting(BettingData::new(content.betting_prompt())),
            GameMode::Buzzer => ModeData::Buzzer(BuzzerData::new(content.buzzer_question())),
            GameMode::PixelReveal => ModeData::PixelReveal(RevealData::new(content.reveal_puzzle())),
            GameMode::Elimination => ModeData::Elimination(EliminationData::new(
                content.elimination_puzzle(),
                config.elimination_attempts,
            )),
            GameMode::Continuation => {
                ModeData::Continuation(ContinuationData::new(content.continuation_prompt()))
            }
        }
    }

    /// The format this data belongs to.
    pub fn mode(&self) -> GameMode {
        match self {
            ModeData::FeatChain(_) => GameMode::FeatChain,
            ModeData::ThemedList(_) => GameMode::ThemedList,
            ModeData::Mytho(_) => GameMode::Mytho,
            ModeData::Betting(_) => GameMode::Betting,
            ModeData::Buzzer(_) => GameMode::Buzzer,
            ModeData::PixelReveal(_) => GameMode::PixelReveal,
            ModeData::Elimination(_) => GameMode::Elimination,
            ModeData::Continuation(_) => GameMode::Continuation,
        }
    }

    /// Duration of the first play window for this mode.
    pub fn initial_window(&self, timers: &PhaseTimers) -> Duration {
        match self {
            ModeData::Betting(_) => timers.betting,
            _ => timers.active,
        }
    }

    /// Validate and apply one submission.
    pub fn submit(&mut self, ctx: &SubmitCtx<'_>, action: ModeAction) -> Result<Accepted, RejectReason> {
        match self {
            ModeData::FeatChain(data) => data.submit(ctx, action),
            ModeData::ThemedList(data) => data.submit(ctx, action),
            ModeData::Mytho(data) => data.submit(ctx, action),
            ModeData::Betting(data) => data.submit(ctx, action),
            ModeData::Buzzer(data) => data.submit(ctx, action),
            ModeData::PixelReveal(data) => data.submit(ctx, action),
            ModeData::Elimination(data) => data.submit(ctx, action),
            ModeData::Continuation(data) => data.submit(ctx, action),
        }
    }

    /// Whether the round reached a terminal state on its own.
    pub fn is_complete(&self) -> bool {
        match self {
            ModeData::FeatChain(data) => data.is_complete(),
            ModeData::ThemedList(data) => data.is_complete(),
            ModeData::Mytho(data) => data.is_complete(),
            ModeData::Betting(data) => data.is_complete(),
            ModeData::Buzzer(data) => data.is_complete(),
            ModeData::PixelReveal(data) => data.is_complete(),
            ModeData::Elimination(data) => data.is_complete(),
            ModeData::Continuation(data) => data.is_complete(),
        }
    }

    /// React to the current play-window deadline expiring.
    pub fn on_deadline(&mut self, timers: &PhaseTimers) -> DeadlineOutcome {
        match self {
            ModeData::Betting(data) => data.on_deadline(timers),
            ModeData::Buzzer(data) => data.on_deadline(timers),
            _ => DeadlineOutcome::Complete,
        }
    }

    /// Reveal the answer key and compute the round outcome.
    pub fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        match self {
            ModeData::FeatChain(data) => data.resolve(trigger),
            ModeData::ThemedList(data) => data.resolve(trigger),
            ModeData::Mytho(data) => data.resolve(trigger),
            ModeData::Betting(data) => data.resolve(trigger),
            ModeData::Buzzer(data) => data.resolve(trigger),
            ModeData::PixelReveal(data) => data.resolve(trigger),
            ModeData::Elimination(data) => data.resolve(trigger),
            ModeData::Continuation(data) => data.resolve(trigger),
        }
    }

    /// Client-safe projection of the in-progress state. Never contains the
    /// answer key.
    pub fn public_view(&self) -> ModePublic {
        match self {
            ModeData::FeatChain(data) => ModePublic::FeatChain(data.public_view()),
            ModeData::ThemedList(data) => ModePublic::ThemedList(data.public_view()),
            ModeData::Mytho(data) => ModePublic::Mytho(data.public_view()),
            ModeData::Betting(data) => ModePublic::Betting(data.public_view()),
            ModeData::Buzzer(data) => ModePublic::Buzzer(data.public_view()),
            ModeData::PixelReveal(data) => ModePublic::PixelReveal(data.public_view()),
            ModeData::Elimination(data) => ModePublic::Elimination(data.public_view()),
            ModeData::Continuation(data) => ModePublic::Continuation(data.public_view()),
        }
    }
}

/// Client-visible projection of the active round, one variant per format.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModePublic {
    /// Collaboration chain.
    FeatChain(chain::ChainPublic),
    /// Themed naming.
    ThemedList(themed::ThemedPublic),
    /// True/false claim.
    Mytho(mytho::MythoPublic),
    /// Sealed bets and proof.
    Betting(betting::BettingPublic),
    /// Buzz and answer.
    Buzzer(buzzer::BuzzerPublic),
    /// Progressive picture reveal.
    PixelReveal(reveal::RevealPublic),
    /// Attribute elimination.
    Elimination(elimination::EliminationPublic),
    /// Lyric continuation.
    Continuation(continuation::ContinuationPublic),
}

/// Strip and trim a free-text payload, rejecting blank input early.
fn answer_text(action: ModeAction) -> Result<String, RejectReason> {
    match action {
        ModeAction::Answer(text) => {
            let trimmed = text.trim().to_string();
            if trimmed.is_empty() {
                Err(RejectReason::EmptySubmission)
            } else {
                Ok(trimmed)
            }
        }
        _ => Err(RejectReason::UnexpectedPayload),
    }
}
