//! Application-level configuration loading: phase timers, damage table,
//! match policy, and room lifecycle knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::game::{GameConfig, text::MatchPolicy};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BEAT_BRAWL_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bounded durations for every player-facing wait.
    pub timers: PhaseTimers,
    /// Damage/combo balance table.
    pub damage: DamageConfig,
    /// Free-text answer tolerance.
    pub match_policy: MatchPolicy,
    /// How long a disconnected player keeps their seat and turn rights.
    pub reconnect_grace: Duration,
    /// How long an empty room stays addressable before the reaper removes it.
    pub room_grace: Duration,
    /// Interval between registry sweeps.
    pub sweep_interval: Duration,
    /// Maximum players (teams plus spectators) per room.
    pub max_players: usize,
    /// Match configuration new rooms start from.
    pub default_game: GameConfig,
}

/// Durations bounding each gameplay phase. Expiry always force-advances.
#[derive(Debug, Clone)]
pub struct PhaseTimers {
    /// Team-reveal sequence before round one.
    pub vs_intro: Duration,
    /// Mode roulette / host pick window.
    pub mode_select: Duration,
    /// Main play window of a round.
    pub active: Duration,
    /// Sealed betting window of the betting mode.
    pub betting: Duration,
    /// Exclusive answer window after a buzz.
    pub answer_window: Duration,
    /// Result display before the next round starts.
    pub result: Duration,
    /// Dispute voting window.
    pub dispute: Duration,
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self {
            vs_intro: Duration::from_secs(6),
            mode_select: Duration::from_secs(8),
            active: Duration::from_secs(60),
            betting: Duration::from_secs(20),
            answer_window: Duration::from_secs(10),
            result: Duration::from_secs(8),
            dispute: Duration::from_secs(15),
        }
    }
}

/// Game-balance table: the shape of the formula is fixed (base damage scaled
/// by a combo-stepped multiplier, optionally bet-weighted), the literals are
/// configuration.
#[derive(Debug, Clone)]
pub struct DamageConfig {
    /// Damage units dealt by a plain round win.
    pub base: u32,
    /// Multiplier per winning-streak length; streaks past the end stay on the
    /// last step.
    pub combo_steps: Vec<f32>,
    /// Whether betting-mode damage grows with the bet size.
    pub bet_scaling: bool,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            base: 10,
            combo_steps: vec![1.0, 1.5, 2.0],
            bet_scaling: true,
        }
    }
}

impl DamageConfig {
    /// Multiplier earned by a `streak`-long run of consecutive wins.
    pub fn multiplier(&self, streak: u32) -> f32 {
        if streak == 0 || self.combo_steps.is_empty() {
            return 1.0;
        }
        let index = (streak as usize - 1).min(self.combo_steps.len() - 1);
        self.combo_steps[index]
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timers: PhaseTimers::default(),
            damage: DamageConfig::default(),
            match_policy: MatchPolicy::default(),
            reconnect_grace: Duration::from_secs(60),
            room_grace: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(30),
            max_players: 12,
            default_game: GameConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults on any read or parse failure.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// JSON representation of the configuration file; every field is optional and
/// falls back to the built-in default.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    timers_ms: Option<RawTimers>,
    damage: Option<RawDamage>,
    match_policy: Option<MatchPolicy>,
    reconnect_grace_s: Option<u64>,
    room_grace_s: Option<u64>,
    sweep_interval_s: Option<u64>,
    max_players: Option<usize>,
    default_game: Option<GameConfig>,
}

/// Phase durations in milliseconds, as written in the config file.
#[derive(Debug, Deserialize)]
struct RawTimers {
    vs_intro: Option<u64>,
    mode_select: Option<u64>,
    active: Option<u64>,
    betting: Option<u64>,
    answer_window: Option<u64>,
    result: Option<u64>,
    dispute: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawDamage {
    base: Option<u32>,
    combo_steps: Option<Vec<f32>>,
    bet_scaling: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let timers = match raw.timers_ms {
            Some(t) => {
                let d = defaults.timers.clone();
                let ms = |v: Option<u64>, fallback: Duration| {
                    v.map(Duration::from_millis).unwrap_or(fallback)
                };
                PhaseTimers {
                    vs_intro: ms(t.vs_intro, d.vs_intro),
                    mode_select: ms(t.mode_select, d.mode_select),
                    active: ms(t.active, d.active),
                    betting: ms(t.betting, d.betting),
                    answer_window: ms(t.answer_window, d.answer_window),
                    result: ms(t.result, d.result),
                    dispute: ms(t.dispute, d.dispute),
                }
            }
            None => defaults.timers.clone(),
        };

        let damage = match raw.damage {
            Some(d) => DamageConfig {
                base: d.base.unwrap_or(defaults.damage.base),
                combo_steps: d
                    .combo_steps
                    .filter(|steps| !steps.is_empty())
                    .unwrap_or_else(|| defaults.damage.combo_steps.clone()),
                bet_scaling: d.bet_scaling.unwrap_or(defaults.damage.bet_scaling),
            },
            None => defaults.damage.clone(),
        };

        Self {
            timers,
            damage,
            match_policy: raw.match_policy.unwrap_or(defaults.match_policy),
            reconnect_grace: raw
                .reconnect_grace_s
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_grace),
            room_grace: raw
                .room_grace_s
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_grace),
            sweep_interval: raw
                .sweep_interval_s
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            max_players: raw.max_players.unwrap_or(defaults.max_players),
            default_game: raw.default_game.unwrap_or(defaults.default_game),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_steps_and_saturates() {
        let damage = DamageConfig::default();
        assert_eq!(damage.multiplier(0), 1.0);
        assert_eq!(damage.multiplier(1), 1.0);
        assert_eq!(damage.multiplier(2), 1.5);
        assert_eq!(damage.multiplier(3), 2.0);
        assert_eq!(damage.multiplier(7), 2.0);
    }

    #[test]
    fn partial_raw_config_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"max_players": 4}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.max_players, 4);
        assert_eq!(config.damage.base, 10);
        assert_eq!(config.timers.active, Duration::from_secs(60));
    }
}
