//! Themed-naming mode: alternating teams name distinct entries matching the
//! active theme. Duplicates and off-theme entries are rejected without
//! flipping the turn; the team on turn when the clock expires loses.

use serde::Serialize;

use crate::{
    content::ThemePuzzle,
    game::{
        GameMode, TeamPair, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx, answer_text,
        },
        text::normalize,
    },
};

/// In-progress state of a themed-naming round.
#[derive(Debug)]
pub struct ThemedData {
    puzzle: ThemePuzzle,
    named: TeamPair<Vec<String>>,
    /// Normalized canonical entries already taken.
    used: Vec<String>,
    turn: TeamSide,
    exhausted: bool,
}

impl ThemedData {
    /// Start a themed round; team A opens.
    pub fn new(puzzle: ThemePuzzle) -> Self {
        Self {
            puzzle,
            named: TeamPair::default(),
            used: Vec::new(),
            turn: TeamSide::A,
            exhausted: false,
        }
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        let text = answer_text(action)?;
        if self.exhausted {
            return Err(RejectReason::WindowClosed);
        }
        if ctx.team != self.turn {
            return Err(RejectReason::NotYourTurn);
        }

        let candidate = self
            .puzzle
            .entries
            .iter()
            .find(|entry| ctx.policy.matches(entry, &text))
            .cloned();
        let Some(candidate) = candidate else {
            return Err(RejectReason::OffTheme);
        };

        let canonical = normalize(&candidate);
        if self.used.contains(&canonical) {
            return Err(RejectReason::Duplicate);
        }

        self.used.push(canonical);
        self.named.get_mut(ctx.team).push(candidate);
        self.turn = self.turn.opponent();
        if self.used.len() == self.puzzle.entries.len() {
            self.exhausted = true;
        }

        Ok(Accepted::events(vec![
            ModeEvent::AnswerResult {
                player: ctx.player,
                team: ctx.team,
                correct: true,
            },
            ModeEvent::TurnUpdate {
                turn: self.turn,
                attempts_left: None,
            },
        ]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.exhausted
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Items(self.puzzle.entries.clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::ThemedList, reveal);
        }
        RoundResult::new(GameMode::ThemedList, Some(self.turn.opponent()), reveal)
    }

    pub(super) fn public_view(&self) -> ThemedPublic {
        ThemedPublic {
            theme: self.puzzle.theme.clone(),
            named: self.named.clone(),
            turn: self.turn,
        }
    }
}

/// Client-visible themed-naming state.
#[derive(Debug, Clone, Serialize)]
pub struct ThemedPublic {
    /// Active theme.
    pub theme: String,
    /// Entries each team has landed so far.
    pub named: TeamPair<Vec<String>>,
    /// Team expected to name next.
    pub turn: TeamSide,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{config::PhaseTimers, game::text::MatchPolicy};

    fn puzzle() -> ThemePuzzle {
        ThemePuzzle {
            theme: "Queen songs".into(),
            entries: vec!["Bohemian Rhapsody".into(), "Under Pressure".into()],
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
    fn duplicate_and_off_theme_keep_the_turn_open() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ThemedData::new(puzzle());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("bohemian rhapsody".into()),
        )
        .unwrap();

        let err = data
            .submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer("Bohemian Rhapsody".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::Duplicate);
        assert_eq!(data.turn, TeamSide::B);

        let err = data
            .submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer("Wonderwall".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::OffTheme);
        assert_eq!(data.turn, TeamSide::B);
    }

    #[test]
    fn exhausting_the_theme_ends_the_round() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ThemedData::new(puzzle());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Bohemian Rhapsody".into()),
        )
        .unwrap();
        data.submit(
            &ctx(TeamSide::B, &policy, &timers),
            ModeAction::Answer("Under Pressure".into()),
        )
        .unwrap();

        assert!(data.is_complete());
        // Team A is back on turn with nothing left to name.
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, Some(TeamSide::B));
    }

    #[test]
    fn timeout_defeats_the_team_on_turn() {
        let data = ThemedData::new(puzzle());
        let result = data.resolve(ResolveTrigger::Timeout);
        assert_eq!(result.winner, Some(TeamSide::B));
        assert_eq!(result.losers, vec![TeamSide::A]);
    }
}
