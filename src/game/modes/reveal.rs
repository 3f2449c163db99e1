//! Pixel-reveal mode: a picture sharpens over the round; any player may
//! guess as often as they like, and the first correct answer takes the
//! round. The sharpening schedule is driven by the room clock, not here.

use serde::Serialize;

use crate::{
    content::RevealPuzzle,
    game::{
        GameMode, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx, answer_text,
        },
    },
};

/// In-progress state of a pixel-reveal round.
#[derive(Debug)]
pub struct RevealData {
    puzzle: RevealPuzzle,
    wrong_guesses: u32,
    winner: Option<TeamSide>,
}

impl RevealData {
    /// Start a reveal round; everyone may guess from the start.
    pub fn new(puzzle: RevealPuzzle) -> Self {
        Self {
            puzzle,
            wrong_guesses: 0,
            winner: None,
        }
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        let text = answer_text(action)?;
        if self.winner.is_some() {
            return Err(RejectReason::WindowClosed);
        }
        let correct = ctx.policy.matches(&self.puzzle.answer, &text);
        if correct {
            self.winner = Some(ctx.team);
        } else {
            self.wrong_guesses += 1;
        }
        Ok(Accepted::events(vec![ModeEvent::AnswerResult {
            player: ctx.player,
            team: ctx.team,
            correct,
        }]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Text(self.puzzle.answer.clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::PixelReveal, reveal);
        }
        match self.winner {
            Some(team) => RoundResult::new(GameMode::PixelReveal, Some(team), reveal),
            // The picture fully resolved with nobody naming it.
            None => RoundResult::draw(GameMode::PixelReveal, reveal),
        }
    }

    pub(super) fn public_view(&self) -> RevealPublic {
        RevealPublic {
            image_url: self.puzzle.image_url.clone(),
            wrong_guesses: self.wrong_guesses,
        }
    }
}

/// Client-visible reveal state.
#[derive(Debug, Clone, Serialize)]
pub struct RevealPublic {
    /// Picture being uncovered.
    pub image_url: String,
    /// Misses so far, both teams combined.
    pub wrong_guesses: u32,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::PhaseTimers,
        game::{TeamPair, text::MatchPolicy},
    };

    fn puzzle() -> RevealPuzzle {
        RevealPuzzle {
            image_url: "https://cdn.example.net/covers/nevermind.jpg".into(),
            answer: "Nirvana".into(),
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
    fn wrong_guesses_do_not_end_the_round() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = RevealData::new(puzzle());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Pearl Jam".into()),
        )
        .unwrap();
        assert!(!data.is_complete());
        assert_eq!(data.public_view().wrong_guesses, 1);

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("nirvana".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        assert_eq!(data.resolve(ResolveTrigger::Natural).winner, Some(TeamSide::A));
    }

    #[test]
    fn timeout_damages_nobody() {
        let data = RevealData::new(puzzle());
        let result = data.resolve(ResolveTrigger::Timeout);
        assert_eq!(result.winner, None);
        assert!(result.losers.is_empty());
    }

    #[test]
    fn guesses_after_the_win_bounce() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = RevealData::new(puzzle());

        data.submit(
            &ctx(TeamSide::B, &policy, &timers),
            ModeAction::Answer("Nirvana".into()),
        )
        .unwrap();
        let err = data
            .submit(
                &ctx(TeamSide::A, &policy, &timers),
                ModeAction::Answer("Nirvana".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::WindowClosed);
    }
}
