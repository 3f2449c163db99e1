//! Round progression: the mode bag a match draws from and the per-round
//! record kept for dispute re-settlement.

use rand::seq::IteratorRandom;

use crate::{
    content::ContentLibrary,
    game::{
        GameConfig, GameMode,
        modes::{ModeData, RoundResult},
        scoring::{Scoreboard, Settlement},
    },
};

/// Modes still owed to the match, one entry per future round.
#[derive(Debug, Clone)]
pub struct ModeBag {
    remaining: Vec<GameMode>,
}

impl ModeBag {
    /// Fill the bag from the room config: each enabled mode appears
    /// `rounds_per_mode` times.
    pub fn new(config: &GameConfig) -> Self {
        let mut remaining = Vec::with_capacity(config.rounds_total() as usize);
        for _ in 0..config.rounds_per_mode {
            remaining.extend(config.enabled_modes.iter().copied());
        }
        Self { remaining }
    }

    /// Rounds left to play.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    /// Whether the match has run out of rounds.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Distinct modes still in the bag, for the roulette and the host pick.
    pub fn options(&self) -> Vec<GameMode> {
        let mut options = Vec::new();
        for &mode in &self.remaining {
            if !options.contains(&mode) {
                options.push(mode);
            }
        }
        options
    }

    /// Draw one mode uniformly at random.
    pub fn draw_random(&mut self) -> Option<GameMode> {
        let index = (0..self.remaining.len()).choose(&mut rand::rng())?;
        Some(self.remaining.swap_remove(index))
    }

    /// Remove one instance of a host-picked mode. Fails when the pick is not
    /// in the bag.
    pub fn take(&mut self, mode: GameMode) -> bool {
        match self.remaining.iter().position(|&m| m == mode) {
            Some(index) => {
                self.remaining.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

/// One in-flight round.
#[derive(Debug)]
pub struct Round {
    /// 1-based round number within the match.
    pub number: u32,
    /// Mode-specific state, answer key included.
    pub data: ModeData,
}

impl Round {
    /// Start round `number` in the given mode, pulling fresh content.
    pub fn new(
        number: u32,
        mode: GameMode,
        content: &dyn ContentLibrary,
        config: &GameConfig,
    ) -> Self {
        Self {
            number,
            data: ModeData::init(mode, content, config),
        }
    }
}

/// Settled round kept in the match history. The pre-round board makes an
/// accepted dispute a pure re-application.
#[derive(Debug)]
pub struct RoundRecord {
    /// Round number the record belongs to.
    pub number: u32,
    /// Outcome as announced.
    pub result: RoundResult,
    /// Score movement as announced.
    pub settlement: Settlement,
    /// Scoreboard snapshot taken before the result was applied.
    pub board_before: Scoreboard,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(modes: &[GameMode], rounds_per_mode: u32) -> GameConfig {
        GameConfig {
            enabled_modes: modes.to_vec(),
            rounds_per_mode,
            ..GameConfig::default()
        }
    }

    #[test]
    fn bag_holds_one_entry_per_round() {
        let bag = ModeBag::new(&config(&[GameMode::Buzzer, GameMode::Mytho], 3));
        assert_eq!(bag.len(), 6);
        assert_eq!(bag.options(), vec![GameMode::Buzzer, GameMode::Mytho]);
    }

    #[test]
    fn host_pick_removes_a_single_instance() {
        let mut bag = ModeBag::new(&config(&[GameMode::Buzzer, GameMode::Mytho], 2));
        assert!(bag.take(GameMode::Buzzer));
        assert!(bag.take(GameMode::Buzzer));
        assert!(!bag.take(GameMode::Buzzer));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn random_draws_empty_the_bag() {
        let mut bag = ModeBag::new(&config(&[GameMode::FeatChain], 2));
        assert!(bag.draw_random().is_some());
        assert!(bag.draw_random().is_some());
        assert!(bag.draw_random().is_none());
        assert!(bag.is_empty());
    }
}
