//! Post-round dispute arbitration.
//!
//! A player on a losing team may contest the round that just settled. The
//! whole room votes inside a bounded window; a strict majority of the cast
//! votes overturns the result in the challenger's favor, anything else
//! (ties included) upholds it. The room re-settles scores from its
//! pre-round snapshot when a dispute lands.

use serde::Serialize;
use uuid::Uuid;

use crate::game::{
    TeamSide,
    modes::{RejectReason, RoundResult},
};

/// An open dispute over the last round result.
#[derive(Debug)]
pub struct Dispute {
    /// Result being contested.
    pub result_id: Uuid,
    /// Player who raised the dispute.
    pub challenger: Uuid,
    /// Team the dispute would hand the round to.
    pub challenger_team: TeamSide,
    votes: Vec<(Uuid, bool)>,
    /// Connected players when the dispute opened; voting closes early once
    /// everyone has spoken.
    expected_voters: usize,
}

impl Dispute {
    /// Open a dispute against `result_id` on behalf of the challenger's team.
    pub fn new(
        result_id: Uuid,
        challenger: Uuid,
        challenger_team: TeamSide,
        expected_voters: usize,
    ) -> Self {
        Self {
            result_id,
            challenger,
            challenger_team,
            votes: Vec::new(),
            expected_voters,
        }
    }

    /// Record one player's vote. Each player votes at most once.
    pub fn vote(&mut self, player: Uuid, accept: bool) -> Result<(), RejectReason> {
        if self.votes.iter().any(|(voter, _)| *voter == player) {
            return Err(RejectReason::AlreadySubmitted);
        }
        self.votes.push((player, accept));
        Ok(())
    }

    /// Whether every expected voter has spoken.
    pub fn all_voted(&self) -> bool {
        self.votes.len() >= self.expected_voters
    }

    /// Tally the cast votes: accepted only on a strict majority.
    pub fn verdict(&self) -> DisputeVerdict {
        let accepts = self.votes.iter().filter(|(_, accept)| *accept).count();
        let rejects = self.votes.len() - accepts;
        DisputeVerdict {
            accepted: accepts > rejects,
            accepts,
            rejects,
        }
    }

    /// The result as it stands after an accepted dispute: same round, winner
    /// flipped to the challenger's team.
    pub fn corrected_result(&self, original: &RoundResult) -> RoundResult {
        let mut corrected = original.clone();
        corrected.winner = Some(self.challenger_team);
        corrected.losers = vec![self.challenger_team.opponent()];
        corrected
    }
}

/// Settled dispute tally.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DisputeVerdict {
    /// Whether the result gets overturned.
    pub accepted: bool,
    /// Accept votes cast.
    pub accepts: usize,
    /// Reject votes cast.
    pub rejects: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameMode, modes::RevealedAnswer};

    fn original() -> RoundResult {
        RoundResult {
            id: Uuid::new_v4(),
            mode: GameMode::Buzzer,
            winner: Some(TeamSide::A),
            losers: vec![TeamSide::B],
            bet: None,
            reveal: RevealedAnswer::Text("Radiohead".into()),
        }
    }

    #[test]
    fn strict_majority_overturns() {
        let result = original();
        let mut dispute = Dispute::new(result.id, Uuid::new_v4(), TeamSide::B, 3);
        dispute.vote(Uuid::new_v4(), true).unwrap();
        dispute.vote(Uuid::new_v4(), true).unwrap();
        dispute.vote(Uuid::new_v4(), false).unwrap();

        assert!(dispute.all_voted());
        assert!(dispute.verdict().accepted);
        let corrected = dispute.corrected_result(&result);
        assert_eq!(corrected.winner, Some(TeamSide::B));
        assert_eq!(corrected.losers, vec![TeamSide::A]);
        assert_eq!(corrected.id, result.id);
    }

    #[test]
    fn tie_upholds_the_original_result() {
        let mut dispute = Dispute::new(Uuid::new_v4(), Uuid::new_v4(), TeamSide::B, 4);
        dispute.vote(Uuid::new_v4(), true).unwrap();
        dispute.vote(Uuid::new_v4(), false).unwrap();

        // Window expires with two of four votes cast.
        assert!(!dispute.all_voted());
        assert!(!dispute.verdict().accepted);
    }

    #[test]
    fn double_votes_are_rejected() {
        let mut dispute = Dispute::new(Uuid::new_v4(), Uuid::new_v4(), TeamSide::A, 2);
        let voter = Uuid::new_v4();
        dispute.vote(voter, true).unwrap();
        assert_eq!(
            dispute.vote(voter, false).unwrap_err(),
            RejectReason::AlreadySubmitted
        );
    }
}
