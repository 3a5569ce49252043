//! Named bot profiles: bundles of AI thresholds.
//! Loaded from TOML at runtime for the arena CLI and game configs.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::engine::config::ConfigError;
use crate::engine::models::Money;
use crate::games::monopoly::ai::BotParams;

/// A named bot profile. Every threshold is optional; missing ones fall back
/// to `BotParams::default()`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct BotProfile {
    pub description: Option<String>,

    pub monopoly_buffer: Option<Money>,
    pub endgame_buffer: Option<Money>,
    pub default_buffer: Option<Money>,
    pub upgrade_reserve_safe: Option<Money>,
    pub upgrade_reserve_default: Option<Money>,
    pub endgame_players: Option<usize>,
}

/// Maps difficulty tiers to profile names.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProductionConfig {
    pub easy: Option<String>,
    pub medium: Option<String>,
    pub hard: Option<String>,
    pub default: Option<String>,
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
    #[serde(default)]
    pub production: ProductionConfig,
}

impl BotProfile {
    pub fn to_params(&self) -> BotParams {
        let d = BotParams::default();
        BotParams {
            monopoly_buffer: self.monopoly_buffer.unwrap_or(d.monopoly_buffer),
            endgame_buffer: self.endgame_buffer.unwrap_or(d.endgame_buffer),
            default_buffer: self.default_buffer.unwrap_or(d.default_buffer),
            upgrade_reserve_safe: self.upgrade_reserve_safe.unwrap_or(d.upgrade_reserve_safe),
            upgrade_reserve_default: self
                .upgrade_reserve_default
                .unwrap_or(d.upgrade_reserve_default),
            endgame_players: self.endgame_players.unwrap_or(d.endgame_players),
        }
    }
}

impl BotProfilesFile {
    pub fn params(&self) -> BTreeMap<String, BotParams> {
        self.profiles
            .iter()
            .map(|(name, p)| (name.clone(), p.to_params()))
            .collect()
    }
}

/// Load profiles from a TOML file at the given path.
pub fn load_profiles(path: &Path) -> Result<BotProfilesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Try to load profiles from well-known paths, returning a default if none found.
pub fn load_default_profiles() -> BotProfilesFile {
    let candidates = [
        "bot_profiles.toml",
        "../bot_profiles.toml",
        "/etc/monopoly/bot_profiles.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_profiles(p) {
                Ok(profiles) => {
                    tracing::info!(path = %p.display(), count = profiles.profiles.len(), "loaded bot profiles");
                    return profiles;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load bot profiles");
                }
            }
        }
    }
    tracing::info!("no bot_profiles.toml found, using built-in defaults");
    BotProfilesFile::default()
}

impl ProductionConfig {
    /// Resolve a difficulty tier to a profile name.
    pub fn resolve(&self, difficulty: &str) -> Option<&str> {
        match difficulty {
            "easy" => self.easy.as_deref(),
            "medium" => self.medium.as_deref(),
            "hard" => self.hard.as_deref(),
            _ => self.default.as_deref(),
        }
    }
}
