//! Betting mode: both teams seal a bet on how many valid items they can
//! name, the higher bidder becomes the prover and must actually land that
//! many, one item at a time, inside a fresh proof window.

use serde::Serialize;

use crate::{
    config::PhaseTimers,
    content::BettingPrompt,
    game::{
        GameMode, TeamPair, TeamSide,
        modes::{
            Accepted, DeadlineOutcome, ModeAction, ModeEvent, RejectReason, ResolveTrigger,
            RevealedAnswer, RoundResult, SubmitCtx, answer_text,
        },
        text::normalize,
    },
};

#[derive(Debug)]
enum Stage {
    /// Bets are sealed; `first` remembers the earlier bettor for tie-breaks.
    Betting {
        bets: TeamPair<Option<u32>>,
        first: Option<TeamSide>,
    },
    /// Bets are public; the prover names items toward its target.
    Proof {
        bets: TeamPair<u32>,
        prover: TeamSide,
        target: u32,
        accepted: Vec<String>,
        /// Normalized forms of accepted items.
        used: Vec<String>,
    },
}

/// In-progress state of a betting round.
#[derive(Debug)]
pub struct BettingData {
    prompt: BettingPrompt,
    stage: Stage,
    /// Set when both bets came in at zero; the round ends with no prover.
    no_contest: bool,
    proof_done: bool,
}

impl BettingData {
    /// Start a betting round; both teams owe a sealed bet.
    pub fn new(prompt: BettingPrompt) -> Self {
        Self {
            prompt,
            stage: Stage::Betting {
                bets: TeamPair::default(),
                first: None,
            },
            no_contest: false,
            proof_done: false,
        }
    }

    /// Unseal the bets and enter the proof stage, or flag a no-contest when
    /// both teams bet zero.
    fn open_proof(&mut self, bets: TeamPair<u32>, first: Option<TeamSide>) -> Option<ModeEvent> {
        if bets.a == 0 && bets.b == 0 {
            self.no_contest = true;
            return None;
        }
        let prover = if bets.a != bets.b {
            if bets.a > bets.b { TeamSide::A } else { TeamSide::B }
        } else {
            // Equal non-zero bets: the team that committed first proves.
            first.unwrap_or(TeamSide::A)
        };
        let target = *bets.get(prover);
        self.stage = Stage::Proof {
            bets,
            prover,
            target,
            accepted: Vec::new(),
            used: Vec::new(),
        };
        Some(ModeEvent::BetRevealed {
            bets,
            prover,
            target,
        })
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        if self.no_contest || self.proof_done {
            return Err(RejectReason::WindowClosed);
        }
        match &mut self.stage {
            Stage::Betting { bets, first } => {
                let ModeAction::Bet(amount) = action else {
                    return Err(RejectReason::UnexpectedPayload);
                };
                if amount as usize > self.prompt.valid_items.len() {
                    return Err(RejectReason::BetOutOfRange);
                }
                let slot = bets.get_mut(ctx.team);
                if slot.is_some() {
                    return Err(RejectReason::AlreadySubmitted);
                }
                *slot = Some(amount);
                if first.is_none() {
                    *first = Some(ctx.team);
                }

                if let (Some(a), Some(b)) = (bets.a, bets.b) {
                    let first = *first;
                    match self.open_proof(TeamPair::new(a, b), first) {
                        Some(event) => {
                            Ok(Accepted::with_window(vec![event], ctx.timers.active))
                        }
                        None => Ok(Accepted::events(vec![])),
                    }
                } else {
                    Ok(Accepted::events(vec![]))
                }
            }
            Stage::Proof {
                prover,
                target,
                accepted,
                used,
                ..
            } => {
                let text = answer_text(action)?;
                if ctx.team != *prover {
                    return Err(RejectReason::NotYourTurn);
                }
                let candidate = self
                    .prompt
                    .valid_items
                    .iter()
                    .find(|item| ctx.policy.matches(item, &text))
                    .cloned();
                let Some(candidate) = candidate else {
                    return Err(RejectReason::OffTheme);
                };
                let canonical = normalize(&candidate);
                if used.contains(&canonical) {
                    return Err(RejectReason::Duplicate);
                }
                used.push(canonical);
                accepted.push(candidate);
                if accepted.len() as u32 >= *target {
                    self.proof_done = true;
                }
                Ok(Accepted::events(vec![ModeEvent::ProofProgress {
                    team: *prover,
                    accepted: accepted.clone(),
                    target: *target,
                }]))
            }
        }
    }

    pub(super) fn is_complete(&self) -> bool {
        self.no_contest || self.proof_done
    }

    pub(super) fn on_deadline(&mut self, timers: &PhaseTimers) -> DeadlineOutcome {
        match &self.stage {
            // Missing bets seal at zero when the betting window expires.
            Stage::Betting { bets, first } => {
                let sealed = TeamPair::new(bets.a.unwrap_or(0), bets.b.unwrap_or(0));
                let first = *first;
                match self.open_proof(sealed, first) {
                    Some(event) => DeadlineOutcome::Extended {
                        events: vec![event],
                        window: timers.active,
                    },
                    None => DeadlineOutcome::Complete,
                }
            }
            Stage::Proof { .. } => DeadlineOutcome::Complete,
        }
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Items(self.prompt.valid_items.clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::Betting, reveal);
        }
        match &self.stage {
            Stage::Betting { .. } => RoundResult::draw(GameMode::Betting, reveal),
            Stage::Proof {
                prover,
                target,
                accepted,
                ..
            } => {
                let mut result = if accepted.len() as u32 >= *target {
                    RoundResult::new(GameMode::Betting, Some(*prover), reveal)
                } else {
                    RoundResult::new(GameMode::Betting, Some(prover.opponent()), reveal)
                };
                result.bet = Some(*target);
                result
            }
        }
    }

    pub(super) fn public_view(&self) -> BettingPublic {
        match &self.stage {
            Stage::Betting { bets, .. } => BettingPublic {
                prompt: self.prompt.prompt.clone(),
                committed: TeamPair::new(bets.a.is_some(), bets.b.is_some()),
                proof: None,
            },
            Stage::Proof {
                bets,
                prover,
                target,
                accepted,
                ..
            } => BettingPublic {
                prompt: self.prompt.prompt.clone(),
                committed: TeamPair::splat(true),
                proof: Some(ProofPublic {
                    bets: *bets,
                    prover: *prover,
                    target: *target,
                    accepted: accepted.clone(),
                }),
            },
        }
    }
}

/// Client-visible betting state; bets stay sealed until the proof stage.
#[derive(Debug, Clone, Serialize)]
pub struct BettingPublic {
    /// The category the teams bet on.
    pub prompt: String,
    /// Which teams have committed a bet.
    pub committed: TeamPair<bool>,
    /// Proof-stage detail once bets are public.
    pub proof: Option<ProofPublic>,
}

/// Public proof-stage detail.
#[derive(Debug, Clone, Serialize)]
pub struct ProofPublic {
    /// Unsealed bets.
    pub bets: TeamPair<u32>,
    /// Team proving its bet.
    pub prover: TeamSide,
    /// Items the prover committed to.
    pub target: u32,
    /// Items landed so far.
    pub accepted: Vec<String>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::game::text::MatchPolicy;

    fn prompt() -> BettingPrompt {
        BettingPrompt {
            prompt: "Daft Punk studio albums".into(),
            valid_items: vec![
                "Homework".into(),
                "Discovery".into(),
                "Human After All".into(),
                "Random Access Memories".into(),
            ],
        }
    }

    fn ctx<'a>(team: TeamSide, policy: &'a MatchPolicy, timers: &'a PhaseTimers) -> SubmitCtx<'a> {
        SubmitCtx {
            player: Uuid::new_v4(),
            team,
            policy,
            timers,
            team_connected: TeamPair::splat(1),
        }
    }

    #[test]
    fn higher_bidder_proves_and_wins_on_target() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BettingData::new(prompt());

        data.submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(2))
            .unwrap();
        let accepted = data
            .submit(&ctx(TeamSide::B, &policy, &timers), ModeAction::Bet(3))
            .unwrap();
        assert!(accepted.window.is_some());
        assert!(matches!(
            accepted.events.as_slice(),
            [ModeEvent::BetRevealed {
                prover: TeamSide::B,
                target: 3,
                ..
            }]
        ));

        // The losing bidder cannot prove.
        let err = data
            .submit(
                &ctx(TeamSide::A, &policy, &timers),
                ModeAction::Answer("Homework".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::NotYourTurn);

        for item in ["Homework", "discovery", "Random Access Memories"] {
            data.submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer(item.into()),
            )
            .unwrap();
        }
        assert!(data.is_complete());

        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, Some(TeamSide::B));
        assert_eq!(result.bet, Some(3));
    }

    #[test]
    fn shortfall_hands_the_round_to_the_opponent() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BettingData::new(prompt());

        data.submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(4))
            .unwrap();
        data.submit(&ctx(TeamSide::B, &policy, &timers), ModeAction::Bet(1))
            .unwrap();
        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Homework".into()),
        )
        .unwrap();

        // Proof window expires two items short.
        assert!(matches!(
            data.on_deadline(&timers),
            DeadlineOutcome::Complete
        ));
        let result = data.resolve(ResolveTrigger::Timeout);
        assert_eq!(result.winner, Some(TeamSide::B));
        assert_eq!(result.losers, vec![TeamSide::A]);
        assert_eq!(result.bet, Some(4));
    }

    #[test]
    fn missing_bets_seal_at_zero_on_deadline() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BettingData::new(prompt());

        data.submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(2))
            .unwrap();
        match data.on_deadline(&timers) {
            DeadlineOutcome::Extended { events, .. } => {
                assert!(matches!(
                    events.as_slice(),
                    [ModeEvent::BetRevealed {
                        prover: TeamSide::A,
                        target: 2,
                        ..
                    }]
                ));
            }
            other => panic!("expected proof stage, got {other:?}"),
        }
    }

    #[test]
    fn twin_zero_bets_end_in_a_draw() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BettingData::new(prompt());

        data.submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(0))
            .unwrap();
        data.submit(&ctx(TeamSide::B, &policy, &timers), ModeAction::Bet(0))
            .unwrap();
        assert!(data.is_complete());

        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, None);
        assert!(result.losers.is_empty());
    }

    #[test]
    fn oversized_and_duplicate_bets_are_rejected() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BettingData::new(prompt());

        let err = data
            .submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(99))
            .unwrap_err();
        assert_eq!(err, RejectReason::BetOutOfRange);

        data.submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(2))
            .unwrap();
        let err = data
            .submit(&ctx(TeamSide::A, &policy, &timers), ModeAction::Bet(3))
            .unwrap_err();
        assert_eq!(err, RejectReason::AlreadySubmitted);
    }
}
