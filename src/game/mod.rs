//! Authoritative match engine: round lifecycle, mode handlers, scoring, disputes.

pub mod dispute;
pub mod modes;
pub mod round;
pub mod scoring;
pub mod text;

use serde::{Deserialize, Serialize};

/// One of the two competing sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    /// Team A.
    A,
    /// Team B.
    B,
}

impl TeamSide {
    /// The side this team plays against.
    pub fn opponent(self) -> TeamSide {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }

    /// Both sides, in stable order.
    pub const BOTH: [TeamSide; 2] = [TeamSide::A, TeamSide::B];
}

/// A value tracked separately for each team (HP, combo, votes, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPair<T> {
    /// Value for team A.
    pub a: T,
    /// Value for team B.
    pub b: T,
}

impl<T> TeamPair<T> {
    /// Build a pair from one value per side.
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Read the value for `side`.
    pub fn get(&self, side: TeamSide) -> &T {
        match side {
            TeamSide::A => &self.a,
            TeamSide::B => &self.b,
        }
    }

    /// Mutable access to the value for `side`.
    pub fn get_mut(&mut self, side: TeamSide) -> &mut T {
        match side {
            TeamSide::A => &mut self.a,
            TeamSide::B => &mut self.b,
        }
    }
}

impl<T: Clone> TeamPair<T> {
    /// Build a pair holding the same value on both sides.
    pub fn splat(value: T) -> Self {
        Self {
            a: value.clone(),
            b: value,
        }
    }
}

/// Identifier of a mini-game format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Collaboration chain: name an artist featured with the chain tail.
    FeatChain,
    /// Name distinct entries matching a theme, alternating turns.
    ThemedList,
    /// True/false claim with simultaneous hidden team votes.
    Mytho,
    /// Sealed bets, then the higher bidder proves their count.
    Betting,
    /// First buzz locks an exclusive answer window.
    Buzzer,
    /// Progressively de-pixelated picture, first correct answer wins.
    PixelReveal,
    /// Guess the hidden artist from per-attribute feedback.
    Elimination,
    /// Continue a quoted lyric, judged fuzzily.
    Continuation,
}

impl GameMode {
    /// Every playable mode, used for default configs and roulette options.
    pub const ALL: [GameMode; 8] = [
        GameMode::FeatChain,
        GameMode::ThemedList,
        GameMode::Mytho,
        GameMode::Betting,
        GameMode::Buzzer,
        GameMode::PixelReveal,
        GameMode::Elimination,
        GameMode::Continuation,
    ];
}

/// How the next round's mode gets picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSelection {
    /// Server rolls a roulette over the remaining mode bag.
    Random,
    /// The host picks, with a timeout fallback to random.
    HostPick,
}

/// Per-room match configuration, host-editable while in the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Formats that can come up during the match.
    pub enabled_modes: Vec<GameMode>,
    /// How many rounds of each enabled mode are played.
    pub rounds_per_mode: u32,
    /// Mode selection strategy.
    pub mode_selection: ModeSelection,
    /// Shared attempt budget for the elimination mode.
    pub elimination_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            enabled_modes: GameMode::ALL.to_vec(),
            rounds_per_mode: 1,
            mode_selection: ModeSelection::Random,
            elimination_attempts: 6,
        }
    }
}

/// Partial config update sent by the host from the lobby.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameConfigPatch {
    /// Replaces the enabled mode set when present.
    #[serde(default)]
    pub enabled_modes: Option<Vec<GameMode>>,
    /// Replaces the rounds-per-mode count when present.
    #[serde(default)]
    pub rounds_per_mode: Option<u32>,
    /// Replaces the selection strategy when present.
    #[serde(default)]
    pub mode_selection: Option<ModeSelection>,
    /// Replaces the elimination attempt budget when present.
    #[serde(default)]
    pub elimination_attempts: Option<u32>,
}

impl GameConfig {
    /// Apply a host-submitted partial update, ignoring absent fields.
    pub fn apply(&mut self, patch: GameConfigPatch) {
        if let Some(modes) = patch.enabled_modes {
            if !modes.is_empty() {
                let mut deduped = Vec::new();
                for mode in modes {
                    if !deduped.contains(&mode) {
                        deduped.push(mode);
                    }
                }
                self.enabled_modes = deduped;
            }
        }
        if let Some(rounds) = patch.rounds_per_mode {
            self.rounds_per_mode = rounds.clamp(1, 5);
        }
        if let Some(strategy) = patch.mode_selection {
            self.mode_selection = strategy;
        }
        if let Some(attempts) = patch.elimination_attempts {
            self.elimination_attempts = attempts.clamp(2, 12);
        }
    }

    /// Total number of rounds the match runs, barring an early knockout.
    pub fn rounds_total(&self) -> u32 {
        self.enabled_modes.len() as u32 * self.rounds_per_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_symmetric() {
        assert_eq!(TeamSide::A.opponent(), TeamSide::B);
        assert_eq!(TeamSide::B.opponent(), TeamSide::A);
    }

    #[test]
    fn patch_ignores_empty_mode_list() {
        let mut config = GameConfig::default();
        config.apply(GameConfigPatch {
            enabled_modes: Some(vec![]),
            ..Default::default()
        });
        assert_eq!(config.enabled_modes.len(), GameMode::ALL.len());
    }

    #[test]
    fn patch_dedupes_modes_and_clamps_rounds() {
        let mut config = GameConfig::default();
        config.apply(GameConfigPatch {
            enabled_modes: Some(vec![GameMode::Buzzer, GameMode::Buzzer, GameMode::Mytho]),
            rounds_per_mode: Some(99),
            ..Default::default()
        });
        assert_eq!(config.enabled_modes, vec![GameMode::Buzzer, GameMode::Mytho]);
        assert_eq!(config.rounds_per_mode, 5);
        assert_eq!(config.rounds_total(), 10);
    }
}
