//! Chain-feature mode: alternating teams extend a collaboration chain.
//!
//! Each submission must name an artist who collaborated with the current
//! chain tail and must not repeat an earlier link. Accepted entries extend
//! the chain and flip the turn; the round ends on timeout or when the tail
//! has no unused collaborators left, and the team on turn at that point
//! loses the round.

use serde::Serialize;

use crate::{
    content::ChainPuzzle,
    game::{
        GameMode, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx, answer_text,
        },
        text::normalize,
    },
};

/// One accepted entry in the chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainLink {
    /// Display name of the artist.
    pub name: String,
    /// Team that played it; `None` for the seed.
    pub team: Option<TeamSide>,
}

/// In-progress state of a chain round.
#[derive(Debug)]
pub struct ChainData {
    puzzle: ChainPuzzle,
    chain: Vec<ChainLink>,
    /// Normalized names already used, seed included.
    used: Vec<String>,
    turn: TeamSide,
    exhausted: bool,
}

impl ChainData {
    /// Seed the chain from a puzzle; team A opens.
    pub fn new(puzzle: ChainPuzzle) -> Self {
        let seed = puzzle.seed.clone();
        Self {
            used: vec![normalize(&seed)],
            chain: vec![ChainLink {
                name: seed,
                team: None,
            }],
            puzzle,
            turn: TeamSide::A,
            exhausted: false,
        }
    }

    fn tail_normalized(&self) -> &str {
        self.used.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether the current tail still has an unused collaborator.
    fn has_extension(&self) -> bool {
        self.puzzle
            .collaborators(self.tail_normalized())
            .iter()
            .any(|candidate| !self.used.contains(&normalize(candidate)))
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

        // Match the guess against the tail's collaborators, fuzzily.
        let candidate = self
            .puzzle
            .collaborators(self.tail_normalized())
            .iter()
            .find(|candidate| ctx.policy.matches(candidate, &text))
            .cloned();
        let Some(candidate) = candidate else {
            return Err(RejectReason::NotACollaborator);
        };

        let canonical = normalize(&candidate);
        if self.used.contains(&canonical) {
            return Err(RejectReason::Duplicate);
        }

        self.used.push(canonical);
        self.chain.push(ChainLink {
            name: candidate,
            team: Some(ctx.team),
        });
        self.turn = self.turn.opponent();
        if !self.has_extension() {
            self.exhausted = true;
        }

        Ok(Accepted::events(vec![ModeEvent::ChainUpdate {
            chain: self.chain.clone(),
            turn: self.turn,
        }]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.exhausted
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Items(self.chain.iter().map(|l| l.name.clone()).collect());
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::FeatChain, reveal);
        }
        // Whoever holds the turn failed to extend the chain.
        RoundResult::new(GameMode::FeatChain, Some(self.turn.opponent()), reveal)
    }

    pub(super) fn public_view(&self) -> ChainPublic {
        ChainPublic {
            chain: self.chain.clone(),
            turn: self.turn,
        }
    }
}

/// Client-visible chain state.
#[derive(Debug, Clone, Serialize)]
pub struct ChainPublic {
    /// Chain so far, seed first.
    pub chain: Vec<ChainLink>,
    /// Team expected to extend next.
    pub turn: TeamSide,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::PhaseTimers,
        game::{TeamPair, text::MatchPolicy},
    };

    fn puzzle() -> ChainPuzzle {
        let mut collaborations = HashMap::new();
        collaborations.insert(
            "jayz".to_string(),
            vec!["Kanye West".to_string(), "Rihanna".to_string()],
        );
        collaborations.insert(
            "kanyewest".to_string(),
            vec!["Jay-Z".to_string(), "Eminem".to_string()],
        );
        collaborations.insert(
            "rihanna".to_string(),
            vec!["Jay-Z".to_string(), "Eminem".to_string()],
        );
        ChainPuzzle {
            seed: "Jay-Z".to_string(),
            collaborations,
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
    fn chain_alternates_and_rejects_out_of_turn() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ChainData::new(puzzle());

        let err = data
            .submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer("Rihanna".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::NotYourTurn);

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("rihanna".into()),
        )
        .unwrap();
        assert_eq!(data.turn, TeamSide::B);
        assert_eq!(data.chain.len(), 2);
    }

    #[test]
    fn repeats_and_strangers_are_rejected_without_flipping_turn() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ChainData::new(puzzle());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Kanye West".into()),
        )
        .unwrap();

        // Jay-Z collaborated with Kanye but is already the seed.
        let err = data
            .submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer("Jay-Z".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::Duplicate);
        assert_eq!(data.turn, TeamSide::B);

        let err = data
            .submit(
                &ctx(TeamSide::B, &policy, &timers),
                ModeAction::Answer("Daft Punk".into()),
            )
            .unwrap_err();
        assert_eq!(err, RejectReason::NotACollaborator);
    }

    #[test]
    fn exhaustion_completes_and_team_on_turn_loses() {
        let policy = MatchPolicy::default();
        let timers = PhaseTimers::default();
        let mut data = ChainData::new(puzzle());

        data.submit(
            &ctx(TeamSide::A, &policy, &timers),
            ModeAction::Answer("Rihanna".into()),
        )
        .unwrap();
        assert!(!data.is_complete());
        // Eminem has no collaborators of his own: the chain is exhausted
        // and team A, back on turn, loses.
        data.submit(
            &ctx(TeamSide::B, &policy, &timers),
            ModeAction::Answer("Eminem".into()),
        )
        .unwrap();
        assert!(data.is_complete());
        let result = data.resolve(ResolveTrigger::Natural);
        assert_eq!(result.winner, Some(TeamSide::B));
        assert_eq!(result.losers, vec![TeamSide::A]);
    }

    #[test]
    fn timeout_defeats_the_team_on_turn() {
        let data = ChainData::new(puzzle());
        let result = data.resolve(ResolveTrigger::Timeout);
        assert_eq!(result.winner, Some(TeamSide::B));
    }
}
