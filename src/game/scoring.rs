//! Health and combo bookkeeping.
//!
//! Each team starts a match at full health. A round win deals damage to the
//! loser, scaled by the winner's current streak; betting rounds add the bet
//! on top of the base before scaling. Health never leaves `0..=MAX_HP` and
//! a team at zero is knocked out.

use serde::Serialize;

use crate::{
    config::DamageConfig,
    game::{GameMode, TeamPair, TeamSide, modes::RoundResult},
};

/// Health every team starts a match with.
pub const MAX_HP: u32 = 100;

/// Per-team health and streak, mutated once per round result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    /// Remaining health per team.
    pub hp: TeamPair<u32>,
    /// Consecutive round wins per team.
    pub streak: TeamPair<u32>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            hp: TeamPair::splat(MAX_HP),
            streak: TeamPair::default(),
        }
    }
}

/// What one round result did to the scoreboard.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    /// Damage dealt to each team this round.
    pub damage: TeamPair<u32>,
    /// Health after the round.
    pub hp: TeamPair<u32>,
    /// Streaks after the round.
    pub streak: TeamPair<u32>,
    /// Teams reduced to zero health this round.
    pub knocked_out: Vec<TeamSide>,
}

impl Scoreboard {
    /// Fresh full-health board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Damage a single round win deals, given the winner's post-win streak.
    fn round_damage(&self, result: &RoundResult, config: &DamageConfig, streak: u32) -> u32 {
        let mut base = config.base;
        if result.mode == GameMode::Betting && config.bet_scaling {
            base += result.bet.unwrap_or(0);
        }
        (base as f32 * config.multiplier(streak)).round() as u32
    }

    /// Apply one round result and report what changed.
    pub fn apply(&mut self, result: &RoundResult, config: &DamageConfig) -> Settlement {
        let mut damage = TeamPair::splat(0u32);

        match result.winner {
            Some(winner) => {
                *self.streak.get_mut(winner) += 1;
                let hit = self.round_damage(result, config, *self.streak.get(winner));
                for &loser in &result.losers {
                    *self.streak.get_mut(loser) = 0;
                    *damage.get_mut(loser) += hit;
                }
            }
            // No winner: losers (if any) take unscaled base damage and
            // nobody's streak moves.
            None => {
                for &loser in &result.losers {
                    *damage.get_mut(loser) += config.base;
                }
            }
        }

        let mut knocked_out = Vec::new();
        for side in TeamSide::BOTH {
            let hp = self.hp.get_mut(side);
            *hp = hp.saturating_sub(*damage.get(side));
            if *hp == 0 {
                knocked_out.push(side);
            }
        }

        Settlement {
            damage,
            hp: self.hp,
            streak: self.streak,
            knocked_out,
        }
    }

    /// Whether either team is out of health.
    pub fn knockout(&self) -> Option<TeamSide> {
        TeamSide::BOTH.into_iter().find(|&side| *self.hp.get(side) == 0)
    }

    /// Team currently ahead on health, `None` on a tie.
    pub fn leader(&self) -> Option<TeamSide> {
        match self.hp.a.cmp(&self.hp.b) {
            std::cmp::Ordering::Greater => Some(TeamSide::A),
            std::cmp::Ordering::Less => Some(TeamSide::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::modes::RevealedAnswer;

    fn win(mode: GameMode, winner: TeamSide) -> RoundResult {
        RoundResult {
            id: uuid::Uuid::new_v4(),
            mode,
            winner: Some(winner),
            losers: vec![winner.opponent()],
            bet: None,
            reveal: RevealedAnswer::None,
        }
    }

    #[test]
    fn streak_steps_scale_damage() {
        let config = DamageConfig::default();
        let mut board = Scoreboard::new();

        // Three straight wins for A: 10, 15, then 20 damage.
        let s = board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        assert_eq!((s.damage.b, s.hp.b, s.streak.a), (10, 90, 1));
        let s = board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        assert_eq!((s.damage.b, s.hp.b, s.streak.a), (15, 75, 2));
        let s = board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        assert_eq!((s.damage.b, s.hp.b, s.streak.a), (20, 55, 3));
    }

    #[test]
    fn losing_resets_the_streak() {
        let config = DamageConfig::default();
        let mut board = Scoreboard::new();

        board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        let s = board.apply(&win(GameMode::Buzzer, TeamSide::B), &config);
        assert_eq!(s.streak.a, 0);
        assert_eq!(s.streak.b, 1);
        // B's first win deals base damage.
        assert_eq!(s.damage.a, 10);
    }

    #[test]
    fn bets_add_to_the_base_before_scaling() {
        let config = DamageConfig::default();
        let mut board = Scoreboard::new();

        let mut result = win(GameMode::Betting, TeamSide::A);
        result.bet = Some(5);
        let s = board.apply(&result, &config);
        assert_eq!(s.damage.b, 15);

        // Same round with bet scaling off falls back to base.
        let flat = DamageConfig {
            bet_scaling: false,
            ..DamageConfig::default()
        };
        let mut board = Scoreboard::new();
        let s = board.apply(&result, &flat);
        assert_eq!(s.damage.b, 10);
    }

    #[test]
    fn double_loss_damages_both_without_touching_streaks() {
        let config = DamageConfig::default();
        let mut board = Scoreboard::new();
        board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);

        let both_wrong = RoundResult {
            id: uuid::Uuid::new_v4(),
            mode: GameMode::Mytho,
            winner: None,
            losers: vec![TeamSide::A, TeamSide::B],
            bet: None,
            reveal: RevealedAnswer::Truth(true),
        };
        let s = board.apply(&both_wrong, &config);
        assert_eq!(s.damage, TeamPair::splat(10));
        // A's streak survives a no-winner round.
        assert_eq!(s.streak.a, 1);
    }

    #[test]
    fn health_floors_at_zero_and_flags_the_knockout() {
        let config = DamageConfig {
            base: 60,
            combo_steps: vec![1.0],
            bet_scaling: true,
        };
        let mut board = Scoreboard::new();

        board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        let s = board.apply(&win(GameMode::Buzzer, TeamSide::A), &config);
        assert_eq!(s.hp.b, 0);
        assert_eq!(s.knocked_out, vec![TeamSide::B]);
        assert_eq!(board.knockout(), Some(TeamSide::B));
        assert_eq!(board.leader(), Some(TeamSide::A));
    }
}
