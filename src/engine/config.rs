//! Game configuration: timings, seats and embedded bot profiles.
//! Loaded from TOML the same way bot profiles are.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::bot_profiles::BotProfile;
use crate::engine::models::{Command, GameDuration, Money, PlayerSetup};
use crate::games::monopoly::ai::BotParams;
use crate::games::monopoly::types::{DEFAULT_START_MONEY, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Delays of every scheduled step, in virtual milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Cosmetic roll animation frames before the dice settle.
    pub roll_frames: u32,
    pub roll_frame_ms: u64,
    /// One square of token movement.
    pub step_ms: u64,
    /// Pause between the last step and landing resolution.
    pub landing_delay_ms: u64,
    pub bankruptcy_display_ms: u64,
    pub bot_roll_ms: u64,
    pub bot_decision_ms: u64,
    pub bot_end_turn_ms: u64,
    /// Countdown period; one second of `time_left` per tick.
    pub tick_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            roll_frames: 10,
            roll_frame_ms: 50,
            step_ms: 150,
            landing_delay_ms: 300,
            bankruptcy_display_ms: 2000,
            bot_roll_ms: 400,
            bot_decision_ms: 800,
            bot_end_turn_ms: 400,
            tick_ms: 1000,
        }
    }
}

impl Timing {
    /// Every animation and thinking delay set to zero. The countdown keeps
    /// its period so timed games still end.
    pub fn instant() -> Self {
        Self {
            roll_frames: 0,
            roll_frame_ms: 0,
            step_ms: 0,
            landing_delay_ms: 0,
            bankruptcy_display_ms: 0,
            bot_roll_ms: 0,
            bot_decision_ms: 0,
            bot_end_turn_ms: 0,
            tick_ms: 1000,
        }
    }

    pub fn roll_ms(&self) -> u64 {
        u64::from(self.roll_frames) * self.roll_frame_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSection {
    pub start_money: Money,
    /// Minutes, `-1` for unlimited.
    pub duration_minutes: GameDuration,
    /// Fixed seed for dice and cards; fresh entropy when absent.
    pub seed: Option<u64>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            start_money: DEFAULT_START_MONEY,
            duration_minutes: GameDuration::Unlimited,
            seed: None,
        }
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameConfigFile {
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub players: Vec<PlayerSetup>,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
}

impl GameConfigFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
            return Err(ConfigError::Invalid(format!(
                "expected {MIN_PLAYERS}-{MAX_PLAYERS} players, found {n}"
            )));
        }
        if self.game.start_money <= 0 {
            return Err(ConfigError::Invalid("start_money must be positive".into()));
        }
        if self.game.duration_minutes == GameDuration::Minutes(0) {
            return Err(ConfigError::Invalid(
                "duration_minutes must be positive or -1".into(),
            ));
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::Invalid("timing.tick_ms must be positive".into()));
        }
        for p in &self.players {
            if let Some(name) = &p.profile {
                if !self.profiles.contains_key(name) {
                    tracing::warn!(player = %p.name, profile = %name, "profile not defined in config");
                }
            }
        }
        Ok(())
    }

    /// The `StartGame` command described by this file.
    pub fn start_command(&self) -> Command {
        Command::StartGame {
            players: self.players.clone(),
            start_money: self.game.start_money,
            duration: self.game.duration_minutes,
        }
    }

    pub fn profile_params(&self) -> BTreeMap<String, BotParams> {
        self.profiles
            .iter()
            .map(|(name, profile)| (name.clone(), profile.to_params()))
            .collect()
    }

    pub fn has_humans(&self) -> bool {
        self.players.iter().any(|p| !p.is_ai)
    }
}

/// Load and validate a game configuration file.
pub fn load_config(path: &Path) -> Result<GameConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    tracing::info!(
        path = %path.display(),
        players = config.players.len(),
        profiles = config.profiles.len(),
        "loaded game config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_full_file() {
        let f = write_tmp(
            r##"
            [game]
            start_money = 2000
            duration_minutes = 30
            seed = 7

            [[players]]
            name = "Rina"
            color = "#22c55e"

            [[players]]
            name = "Bot"
            is_ai = true
            profile = "careful"

            [timing]
            step_ms = 10

            [profiles.careful]
            default_buffer = 600
            "##,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.game.start_money, 2000);
        assert_eq!(cfg.game.duration_minutes, GameDuration::Minutes(30));
        assert_eq!(cfg.game.seed, Some(7));
        assert_eq!(cfg.players.len(), 2);
        assert!(cfg.players[1].is_ai);
        assert_eq!(cfg.players[0].color, "#22c55e");
        assert_eq!(cfg.timing.step_ms, 10);
        assert_eq!(cfg.timing.landing_delay_ms, 300);
        let params = cfg.profile_params();
        assert_eq!(params["careful"].default_buffer, 600);
        assert_eq!(params["careful"].monopoly_buffer, BotParams::default().monopoly_buffer);
        assert!(cfg.has_humans());
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let f = write_tmp(
            r#"
            [[players]]
            name = "A"
            [[players]]
            name = "B"
            "#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.game.start_money, DEFAULT_START_MONEY);
        assert_eq!(cfg.game.duration_minutes, GameDuration::Unlimited);
        assert_eq!(cfg.timing, Timing::default());
    }

    #[test]
    fn rejects_single_player() {
        let f = write_tmp("[[players]]\nname = \"Solo\"\n");
        assert!(matches!(load_config(f.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn reports_parse_and_read_errors() {
        let f = write_tmp("[game\nstart_money = ");
        assert!(matches!(load_config(f.path()), Err(ConfigError::Parse { .. })));
        let missing = Path::new("/definitely/not/here.toml");
        assert!(matches!(load_config(missing), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn instant_timing_keeps_tick() {
        let t = Timing::instant();
        assert_eq!(t.roll_ms(), 0);
        assert_eq!(t.tick_ms, 1000);
        assert_eq!(Timing::default().roll_ms(), 500);
    }
}
