//! Lyric-continuation mode: each team gets one shot at continuing the
//! quoted excerpt, team A first. The judge accepts fuzzy matches and long
//! exact prefixes of the expected line.

use serde::Serialize;

use crate::{
    content::ContinuationPrompt,
    game::{
        GameMode, TeamPair, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx, answer_text,
        },
    },
};

/// In-progress state of a continuation round.
#[derive(Debug)]
pub struct ContinuationData {
    prompt: ContinuationPrompt,
    attempted: TeamPair<bool>,
    turn: TeamSide,
    winner: Option<TeamSide>,
}

impl ContinuationData {
    /// Start a continuation round; team A answers first.
    pub fn new(prompt: ContinuationPrompt) -> Self {
        Self {
            prompt,
            attempted: TeamPair::default(),
            turn: TeamSide::A,
            winner: None,
        }
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        let text = answer_text(action)?;
        if self.is_complete() {
            return Err(RejectReason::WindowClosed);
        }
        if ctx.team != self.turn {
            return Err(RejectReason::NotYourTurn);
        }

        *self.attempted.get_mut(ctx.team) = true;
        let correct = ctx
            .policy
            .continuation_matches(&self.prompt.continuation, &text);
        if correct {
            self.winner = Some(ctx.team);
        } else {
            self.turn = self.turn.opponent();
        }
        Ok(Accepted::events(vec![ModeEvent::AnswerResult {
            player: ctx.player,
            team: ctx.team,
            correct,
        }]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.winner.is_some() || (self.attempted.a && self.attempted.b)
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Text(self.prompt.continuation.clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::Continuation, reveal);
        }
        match self.winner {
            Some(team) => RoundResult::new(GameMode::Continuation, Some(team), reveal),
            // Both shots missed, or the clock ran out.
            None => RoundResult::draw(GameMode::Continuation, reveal),
        }
    }

    pub(super) fn public_view(&self) -> ContinuationPublic {
        ContinuationPublic {
            prompt: self.prompt.prompt.clone(),
            attempted: self.attempted,
            turn: self.turn,
        }
    }
}

/// Client-visible continuation state.
#[derive(Debug, Clone, Serialize)]
pub struct ContinuationPublic {
    /// Excerpt to continue.
    pub prompt: String,
    /// Which teams have spent their shot.
    pub attempted: TeamPair<bool>,
    /// Team expected to answer next.
    pub turn: TeamSide,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{config::PhaseTimers, game::text::MatchPolicy};

    fn prompt() -> ContinuationPrompt {
        ContinuationPrompt {
            prompt: "Hello darkness my old friend,".into(),
            continuation: "I've come to talk with you again".into(),
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
    fn fuzzy_continuation_wins_on_the_spot() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ContinuationData::new(prompt());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("ive come to talk with you again".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        assert_eq!(data.resolve(ResolveTrigger::Natural).winner, Some(TeamSide::A));
    }

    #[test]
    fn miss_passes_the_shot_to_the_other_team() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ContinuationData::new(prompt());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("something else entirely".into()),
        )
        .unwrap();
        assert!(!data.is_complete());
        assert_eq!(data.turn, TeamSide::B);

        // Team A spent its only shot.
        let err = data
            .submit(
                &ctx(TeamSide::A, &policy, &timers),
                ModeAction::Answer("I've come to talk with you again".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::NotYourTurn);

        data.submit(
            &ctx(TeamSide::B, &policy, &timers),
            ModeAction::Answer("wrong again".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, None);
        assert!(result.losers.is_empty());
    }

    #[test]
    fn long_exact_prefix_is_accepted() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ContinuationData::new(prompt());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("I've come to talk with you".into()),
        )
        .unwrap();
        assert_eq!(data.resolve(ResolveTrigger::Natural).winner, Some(TeamSide::A));
    }
}
