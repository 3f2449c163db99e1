//! True/false claim mode: every player votes, votes stay sealed until both
//! teams have voted or the clock expires, then both team verdicts are
//! revealed together.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    content::MythoClaim,
    game::{
        GameMode, TeamPair, TeamSide,
        modes::{
            Accepted, ModeAction, ModeEvent, RejectReason, ResolveTrigger, RevealedAnswer,
            RoundResult, SubmitCtx,
        },
    },
};

/// In-progress state of a mytho round.
#[derive(Debug)]
pub struct MythoData {
    claim: MythoClaim,
    /// Votes cast per team, in arrival order.
    votes: TeamPair<Vec<(Uuid, bool)>>,
    all_voted: bool,
}

impl MythoData {
    /// Start a mytho round from a claim.
    pub fn new(claim: MythoClaim) -> Self {
        Self {
            claim,
            votes: TeamPair::default(),
            all_voted: false,
        }
    }

    /// Majority verdict of a team's cast votes; ties resolve to the earliest
    /// vote. `None` when the team never voted.
    fn team_verdict(&self, side: TeamSide) -> Option<bool> {
        let votes = self.votes.get(side);
        let first = votes.first().map(|(_, value)| *value)?;
        let trues = votes.iter().filter(|(_, value)| *value).count();
        let falses = votes.len() - trues;
        if trues == falses {
            Some(first)
        } else {
            Some(trues > falses)
        }
    }

    pub(super) fn submit(
        &mut self,
        ctx: &SubmitCtx<'_>,
        action: ModeAction,
    ) -> Result<Accepted, RejectReason> {
        let ModeAction::Vote(value) = action else {
            return Err(RejectReason::UnexpectedPayload);
        };
        if self.all_voted {
            return Err(RejectReason::WindowClosed);
        }
        let votes = self.votes.get_mut(ctx.team);
        if votes.iter().any(|(player, _)| *player == ctx.player) {
            return Err(RejectReason::AlreadySubmitted);
        }
        votes.push((ctx.player, value));

        self.all_voted = TeamSide::BOTH.iter().all(|&side| {
            let cast = self.votes.get(side).len();
            cast >= *ctx.team_connected.get(side)
        });

        Ok(Accepted::events(vec![ModeEvent::MythoVote {
            team: ctx.team,
            votes_cast: self.votes.get(ctx.team).len(),
        }]))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.all_voted
    }

    pub(super) fn resolve(&self, trigger: ResolveTrigger) -> RoundResult {
        let reveal = RevealedAnswer::Truth(self.claim.truth);
        if trigger == ResolveTrigger::Skipped {
            return RoundResult::draw(GameMode::Mytho, reveal);
        }

        let correct = TeamPair::new(
            self.team_verdict(TeamSide::A) == Some(self.claim.truth),
            self.team_verdict(TeamSide::B) == Some(self.claim.truth),
        );
        let mut result = match (correct.a, correct.b) {
            (true, false) => RoundResult::new(GameMode::Mytho, Some(TeamSide::A), reveal),
            (false, true) => RoundResult::new(GameMode::Mytho, Some(TeamSide::B), reveal),
            // Both right: clean tie, nobody takes damage.
            (true, true) => RoundResult::draw(GameMode::Mytho, reveal),
            // Both fooled: both take unscaled damage, combos untouched.
            (false, false) => RoundResult::draw(GameMode::Mytho, reveal),
        };
        if !correct.a && !correct.b {
            result.losers = vec![TeamSide::A, TeamSide::B];
        }
        result
    }

    /// Team verdicts, exposed only at resolution time for the result event.
    pub fn verdicts(&self) -> TeamPair<Option<bool>> {
        TeamPair::new(
            self.team_verdict(TeamSide::A),
            self.team_verdict(TeamSide::B),
        )
    }

    pub(super) fn public_view(&self) -> MythoPublic {
        MythoPublic {
            statement: self.claim.statement.clone(),
            votes_cast: TeamPair::new(self.votes.a.len(), self.votes.b.len()),
        }
    }
}

/// Client-visible mytho state: the statement and sealed vote counts only.
#[derive(Debug, Clone, Serialize)]
pub struct MythoPublic {
    /// Claim under judgment.
    pub statement: String,
    /// How many members of each team have voted (values stay hidden).
    pub votes_cast: TeamPair<usize>,
}
