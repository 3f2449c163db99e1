//! Elimination mode: teams alternate guessing the hidden artist from a
//! known candidate pool, burning a shared attempt budget. Every miss is
//! graded attribute by attribute so both teams narrow the pool together.

use serde::Serialize;

use crate::{
    content::{ArtistProfile, EliminationPuzzle},
    game::{
        GameMode, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx, answer_text,
        },
    },
};

/// How a single attribute of a guess compares to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGrade {
    /// Same value as the target.
    Exact,
    /// Different value.
    Miss,
}

/// Which way a numeric attribute needs to move to reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Target value is higher than the guess.
    Higher,
    /// Target value is lower than the guess.
    Lower,
}

/// Graded numeric attribute of a guess.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NumericFeedback {
    /// Guessed value.
    pub value: u16,
    /// Exact, close, or miss.
    pub grade: NumericGrade,
    /// Direction toward the target, absent on an exact hit.
    pub direction: Option<Direction>,
}

/// Grade of a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericGrade {
    /// Same value as the target.
    Exact,
    /// Within the close band.
    Close,
    /// Outside the close band.
    Miss,
}

/// Full per-attribute grading of one guess, broadcast to both teams.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFeedback {
    /// Guessed candidate name.
    pub name: String,
    /// Team that guessed.
    pub team: TeamSide,
    /// Debut-year grading; close means within three years.
    pub debut_year: NumericFeedback,
    /// Genre grading.
    pub genre: MatchGrade,
    /// Origin grading.
    pub origin: MatchGrade,
    /// Group-size grading; close means within one member.
    pub group_size: NumericFeedback,
}

/// In-progress state of an elimination round.
#[derive(Debug)]
pub struct EliminationData {
    puzzle: EliminationPuzzle,
    attempts_left: u32,
    history: Vec<AttemptFeedback>,
    turn: TeamSide,
    found: Option<TeamSide>,
}

const YEAR_CLOSE_BAND: u16 = 3;
const SIZE_CLOSE_BAND: u8 = 1;

fn grade_numeric(guess: u16, target: u16, close_band: u16) -> NumericFeedback {
    let grade = if guess == target {
        NumericGrade::Exact
    } else if guess.abs_diff(target) <= close_band {
        NumericGrade::Close
    } else {
        NumericGrade::Miss
    };
    let direction = if guess == target {
        None
    } else if target > guess {
        Some(Direction::Higher)
    } else {
        Some(Direction::Lower)
    };
    NumericFeedback {
        value: guess,
        grade,
        direction,
    }
}

fn grade_label(guess: &str, target: &str) -> MatchGrade {
    if guess.eq_ignore_ascii_case(target) {
        MatchGrade::Exact
    } else {
        MatchGrade::Miss
    }
}

impl EliminationData {
    /// Start an elimination round with a shared attempt budget; team A opens.
    pub fn new(puzzle: EliminationPuzzle, attempts: u32) -> Self {
        Self {
            puzzle,
            attempts_left: attempts,
            history: Vec::new(),
            turn: TeamSide::A,
            found: None,
        }
    }

    fn target(&self) -> &ArtistProfile {
        &self.puzzle.candidates[self.puzzle.target]
    }

    fn grade(&self, guess: &ArtistProfile, team: TeamSide) -> AttemptFeedback {
        let target = self.target();
        AttemptFeedback {
            name: guess.name.clone(),
            team,
            debut_year: grade_numeric(guess.debut_year, target.debut_year, YEAR_CLOSE_BAND),
            genre: grade_label(&guess.genre, &target.genre),
            origin: grade_label(&guess.origin, &target.origin),
            group_size: grade_numeric(
                guess.group_size as u16,
                target.group_size as u16,
                SIZE_CLOSE_BAND as u16,
            ),
        }
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        let text = answer_text(action)?;
        if self.found.is_some() || self.attempts_left == 0 {
            return Err(RejectReason::WindowClosed);
        }
        if ctx.team != self.turn {
            return Err(RejectReason::NotYourTurn);
        }

        let guess = self
            .puzzle
            .candidates
            .iter()
            .find(|candidate| ctx.policy.matches(&candidate.name, &text))
            .cloned();
        let Some(guess) = guess else {
            // Unknown names do not burn an attempt.
            return Err(RejectReason::UnknownEntity);
        };

        if guess.name == self.target().name {
            self.found = Some(ctx.team);
            return Ok(Accepted::events(vec![ModeEvent::AnswerResult {
                player: ctx.player,
                team: ctx.team,
                correct: true,
            }]));
        }

        self.attempts_left -= 1;
        let feedback = self.grade(&guess, ctx.team);
        self.history.push(feedback.clone());
        self.turn = self.turn.opponent();

        Ok(Accepted::events(vec![
            ModeEvent::AttemptFeedback {
                feedback,
                attempts_left: self.attempts_left,
            },
            ModeEvent::TurnUpdate {
                turn: self.turn,
                attempts_left: Some(self.attempts_left),
            },
        ]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.found.is_some() || self.attempts_left == 0
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Profile(self.target().clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::Elimination, reveal);
        }
        match self.found {
            Some(team) => RoundResult::new(GameMode::Elimination, Some(team), reveal),
            None if trigger == ResolveTrigger::Timeout => {
                // Clock ran out mid-round; the team on turn stalled.
                RoundResult::new(GameMode::Elimination, Some(self.turn.opponent()), reveal)
            }
            // Budget burned with nobody landing the target.
            None => RoundResult::draw(GameMode::Elimination, reveal),
        }
    }

    pub(super) fn public_view(&self) -> EliminationPublic {
        EliminationPublic {
            candidates: self
                .puzzle
                .candidates
                .iter()
                .map(|candidate| candidate.name.clone())
                .collect(),
            history: self.history.clone(),
            attempts_left: self.attempts_left,
            turn: self.turn,
        }
    }
}

/// Client-visible elimination state; the target index never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct EliminationPublic {
    /// Guessable candidate names.
    pub candidates: Vec<String>,
    /// Graded attempts so far.
    pub history: Vec<AttemptFeedback>,
    /// Remaining shared attempts.
    pub attempts_left: u32,
    /// Team expected to guess next.
    pub turn: TeamSide,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::PhaseTimers,
        game::{TeamPair, text::MatchPolicy},
    };

    fn profile(name: &str, year: u16, genre: &str, origin: &str, size: u8) -> ArtistProfile {
        ArtistProfile {
            name: name.into(),
            debut_year: year,
            genre: genre.into(),
            origin: origin.into(),
            group_size: size,
        }
    }

    fn puzzle() -> EliminationPuzzle {
        EliminationPuzzle {
            candidates: vec![
                profile("Daft Punk", 1993, "electro", "France", 2),
                profile("Justice", 2003, "electro", "France", 2),
                profile("Stromae", 2009, "pop", "Belgium", 1),
            ],
            // Justice is the hidden target.
            target: 1,
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
    fn miss_is_graded_per_attribute_and_flips_the_turn() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = EliminationData::new(puzzle(), 4);

        let accepted = data
            .submit(
                &ctx(TeamSide::A, &policy, &timers),
                ModeAction::Answer("Daft Punk".into()),
            )
            .unwrap();
        let [ModeEvent::AttemptFeedback {
            feedback,
            attempts_left,
        }, ModeEvent::TurnUpdate { turn, .. }] = accepted.events.as_slice()
        else {
            panic!("unexpected events: {:?}", accepted.events);
        };
        assert_eq!(*attempts_left, 3);
        assert_eq!(*turn, TeamSide::B);
        // 1993 vs 2003: a miss, target is later.
        assert_eq!(feedback.debut_year.grade, NumericGrade::Miss);
        assert_eq!(feedback.debut_year.direction, Some(Direction::Higher));
        assert_eq!(feedback.genre, MatchGrade::Exact);
        assert_eq!(feedback.origin, MatchGrade::Exact);
        assert_eq!(feedback.group_size.grade, NumericGrade::Exact);
    }

    #[test]
    fn unknown_guess_keeps_attempts_and_turn() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = EliminationData::new(puzzle(), 4);

        let err = data
            .submit(
                &ctx(TeamSide::A, &policy, &timers),
                ModeAction::Answer("Kraftwerk".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::UnknownEntity);
        assert_eq!(data.attempts_left, 4);
        assert_eq!(data.turn, TeamSide::A);
    }

    #[test]
    fn exact_hit_wins_without_burning_an_attempt() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = EliminationData::new(puzzle(), 4);

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("justice".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        assert_eq!(data.attempts_left, 4);
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, Some(TeamSide::A));
        assert!(matches!(result.reveal, RevealedAnswer::Profile(_)));
    }

    #[test]
    fn exhausted_budget_ends_in_a_draw() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = EliminationData::new(puzzle(), 2);

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Daft Punk".into()),
        )
        .unwrap();
        data.submit(
            &ctx(TeamSide::B, &policy, &timers),
            ModeAction::Answer("Stromae".into()),
        )
        .unwrap();

        assert!(data.is_complete());
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, None);
        assert!(result.losers.is_empty());
    }
}
