//! Buzzer mode: open question, first buzz locks an exclusive answer window.
//!
//! A wrong answer (or an expired answer window) locks that team out and
//! reopens buzzing for the other team. With both teams locked out the round
//! ends with no winner and no damage.

use serde::Serialize;

use crate::{
    config::PhaseTimers,
    content::BuzzerQuestion,
    game::{
        GameMode, TeamPair, TeamSide,
        modes::{
            Accepted, DeadlineOutcome, ModeAction, ModeEvent, RejectReason, ResolveTrigger,
            RevealedAnswer, RoundResult, SubmitCtx, answer_text,
        },
    },
};

#[derive(Debug)]
enum Stage {
    /// Waiting for a buzz. `eligible` narrows to one team after a lockout.
    Open { eligible: Option<TeamSide> },
    /// A buzz holds the floor; only the buzzing team may answer.
    Answering { team: TeamSide },
}

/// In-progress state of a buzzer round.
#[derive(Debug)]
pub struct BuzzerData {
    question: BuzzerQuestion,
    stage: Stage,
    locked_out: TeamPair<bool>,
    winner: Option<TeamSide>,
    dead: bool,
}

impl BuzzerData {
    /// Start a buzzer round with both teams eligible.
    pub fn new(question: BuzzerQuestion) -> Self {
        Self {
            question,
            stage: Stage::Open { eligible: None },
            locked_out: TeamPair::default(),
            winner: None,
            dead: false,
        }
    }

    /// Lock `team` out and reopen for the other team, or kill the round when
    /// both teams have failed.
    fn lock_out(&mut self, team: TeamSide) -> Option<ModeEvent> {
        *self.locked_out.get_mut(team) = true;
        let other = team.opponent();
        if *self.locked_out.get(other) {
            self.dead = true;
            return None;
        }
        self.stage = Stage::Open {
            eligible: Some(other),
        };
        Some(ModeEvent::BuzzReopened { eligible: other })
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        if self.dead || self.winner.is_some() {
            return Err(RejectReason::WindowClosed);
        }
        match &self.stage {
            Stage::Open { eligible } => {
                if !matches!(action, ModeAction::Buzz) {
                    return Err(RejectReason::UnexpectedPayload);
                }
                if *self.locked_out.get(ctx.team) {
                    return Err(RejectReason::WindowClosed);
                }
                if eligible.is_some_and(|side| side != ctx.team) {
                    return Err(RejectReason::WindowClosed);
                }
                self.stage = Stage::Answering { team: ctx.team };
                Ok(Accepted::with_window(
                    vec![ModeEvent::BuzzResult {
                        team: ctx.team,
                        player: ctx.player,
                    }],
                    ctx.timers.answer_window,
                ))
            }
            Stage::Answering { team } => {
                let team = *team;
                // A second buzz while the floor is held is just late.
                if matches!(action, ModeAction::Buzz) {
                    return Err(RejectReason::WindowClosed);
                }
                let text = answer_text(action)?;
                // The buzz locks the floor for the whole team, so any
                // teammate may deliver the answer.
                if ctx.team != team {
                    return Err(RejectReason::NotYourTurn);
                }
                if ctx.policy.matches(&self.question.answer, &text) {
                    self.winner = Some(team);
                    return Ok(Accepted::events(vec![ModeEvent::AnswerResult {
                        player: ctx.player,
                        team,
                        correct: true,
                    }]));
                }
                let mut events = vec![ModeEvent::AnswerResult {
                    player: ctx.player,
                    team,
                    correct: false,
                }];
                let reopened = self.lock_out(team);
                events.extend(reopened);
                if self.dead {
                    Ok(Accepted::events(events))
                } else {
                    Ok(Accepted::with_window(events, ctx.timers.active))
                }
            }
        }
    }

    pub(super) fn is_complete(&self) -> bool {
        self.dead || self.winner.is_some()
    }

    pub(super) fn on_deadline(&mut self, timers: &PhaseTimers) -> DeadlineOutcome {
        match &self.stage {
            // Nobody buzzed in time.
            Stage::Open { .. } => DeadlineOutcome::Complete,
            // The buzzing team let its answer window lapse.
            Stage::Answering { team } => {
                let team = *team;
                match self.lock_out(team) {
                    Some(event) => DeadlineOutcome::Extended {
                        events: vec![event],
                        window: timers.active,
                    },
                    None => DeadlineOutcome::Complete,
                }
            }
        }
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Text(self.question.answer.clone());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::Buzzer, reveal);
        }
        match self.winner {
            Some(team) => RoundResult::new(GameMode::Buzzer, Some(team), reveal),
            // Unanswered questions damage nobody.
            None => RoundResult::draw(GameMode::Buzzer, reveal),
        }
    }

    pub(super) fn public_view(&self) -> BuzzerPublic {
        let (locked_by, eligible) = match &self.stage {
            Stage::Open { eligible } => (None, *eligible),
            Stage::Answering { team } => (Some(*team), None),
        };
        BuzzerPublic {
            question: self.question.question.clone(),
            locked_by,
            eligible,
        }
    }
}

/// Client-visible buzzer state.
#[derive(Debug, Clone, Serialize)]
pub struct BuzzerPublic {
    /// The open question.
    pub question: String,
    /// Team currently holding the floor, if any.
    pub locked_by: Option<TeamSide>,
    /// Only team still allowed to buzz, after a lockout.
    pub eligible: Option<TeamSide>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::game::text::MatchPolicy;

    fn question() -> BuzzerQuestion {
        BuzzerQuestion {
            question: "Which band released 'Paranoid Android'?".into(),
            answer: "Radiohead".into(),
        }
    }

    fn ctx<'a>(
        player: Uuid,
        team: TeamSide,
        policy: &'a MatchPolicy,
        timers: &'a PhaseTimers,
    ) -> SubmitCtx<'a> {
        SubmitCtx {
            player,
            team,
            policy,
            timers,
            team_connected: TeamPair::splat(1),
        }
    }

    #[test]
    fn first_buzz_locks_the_floor() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BuzzerData::new(question());
        let fast = Uuid::new_v4();
        let slow = Uuid::new_v4();

        let accepted = data
            .submit(&ctx(fast, TeamSide::B, &policy, &timers), ModeAction::Buzz)
            .unwrap();
        assert_eq!(accepted.window, Some(timers.answer_window));

        // The losing buzz arrives a beat later and bounces.
        let err = data
            .submit(&ctx(slow, TeamSide::A, &policy, &timers), ModeAction::Buzz)
            .unwrap_err();
        assert_eq!(err, RejectReason::WindowClosed);

        // Only the buzzing team may answer.
        let err = data
            .submit(
                &ctx(slow, TeamSide::A, &policy, &timers),
                ModeAction::Answer("Radiohead".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::NotYourTurn);

        data.submit(
            &ctx(fast, TeamSide::B, &policy, &timers),
            ModeAction::Answer("radiohead".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        assert_eq!(data.resolve(ResolveTrigger::Natural).winner, Some(TeamSide::B));
    }

    #[test]
    fn buzz_locks_the_floor_for_the_whole_team() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BuzzerData::new(question());
        let buzzer = Uuid::new_v4();
        let teammate = Uuid::new_v4();

        data.submit(&ctx(buzzer, TeamSide::A, &policy, &timers), ModeAction::Buzz)
            .unwrap();

        // A teammate of the buzzer may deliver the answer.
        let accepted = data
            .submit(
                &ctx(teammate, TeamSide::A, &policy, &timers),
                ModeAction::Answer("Radiohead".into()),
            )
            .unwrap();
        assert!(matches!(
            accepted.events.as_slice(),
            [ModeEvent::AnswerResult { player, correct: true, .. }] if *player == teammate
        ));
        assert_eq!(data.resolve(ResolveTrigger::Natural).winner, Some(TeamSide::A));
    }

    #[test]
    fn wrong_answer_reopens_for_the_other_team() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BuzzerData::new(question());
        let player = Uuid::new_v4();

        data.submit(&ctx(player, TeamSide::A, &policy, &timers), ModeAction::Buzz)
            .unwrap();
        let accepted = data
            .submit(
                &ctx(player, TeamSide::A, &policy, &timers),
                ModeAction::Answer("Muse".into()),
            )
            .unwrap();
        assert!(matches!(
            accepted.events.as_slice(),
            [
                ModeEvent::AnswerResult { correct: false, .. },
                ModeEvent::BuzzReopened {
                    eligible: TeamSide::B
                }
            ]
        ));

        // Team A is locked out for the rest of the round.
        let err = data
            .submit(&ctx(player, TeamSide::A, &policy, &timers), ModeAction::Buzz)
            .unwrap_err();
        assert_eq!(err, RejectReason::WindowClosed);
    }

    #[test]
    fn both_lockouts_end_with_no_damage() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BuzzerData::new(question());

        for team in TeamSide::BOTH {
            let player = Uuid::new_v4();
            data.submit(&ctx(player, team, &policy, &timers), ModeAction::Buzz)
                .unwrap();
            data.submit(
                &ctx(player, team, &policy, &timers),
                ModeAction::Answer("Oasis".into()),
            )
            .unwrap();
        }

        assert!(data.is_complete());
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, None);
        assert!(result.losers.is_empty());
    }

    #[test]
    fn lapsed_answer_window_locks_the_buzzing_team_out() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = BuzzerData::new(question());

        data.submit(
            &ctx(Uuid::new_v4(), TeamSide::A, &policy, &timers),
            ModeAction::Buzz,
        )
        .unwrap();
        match data.on_deadline(&timers) {
            DeadlineOutcome::Extended { events, .. } => assert!(matches!(
                events.as_slice(),
                [ModeEvent::BuzzReopened {
                    eligible: TeamSide::B
                }]
            )),
            other => panic!("expected a reopen, got {other:?}"),
        }
    }
}
