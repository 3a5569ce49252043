//! Replay logs: the seed, timing and every accepted command with the virtual
//! time it was applied at. Replaying a log rebuilds the exact final state.
//!
//! Each command also records how many ticks and scheduled entries had fired
//! before it, which pins it down even when many items share one instant.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::config::Timing;
use crate::engine::models::Command;
use crate::games::monopoly::ai::BotParams;
use crate::games::monopoly::Game;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed replay log: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub at_ms: u64,
    /// Ticks and scheduled entries fired before the command was applied.
    pub fired: u64,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub seed: u64,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub profiles: BTreeMap<String, BotParams>,
    pub entries: Vec<ReplayEntry>,
    /// Virtual time the log was taken at.
    pub end_ms: u64,
    pub end_fired: u64,
}

impl ReplayLog {
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Rebuild a game from its log. Bots bound with `Game::bind_bot` are not
/// part of the log; AI seats replay with their profile's thresholds.
pub fn replay(log: &ReplayLog) -> Game {
    let mut game = Game::with_timing(log.seed, log.timing).with_profiles(log.profiles.clone());
    for entry in &log.entries {
        game.catch_up(entry.fired, entry.at_ms);
        let outcome = game.apply(entry.command.clone());
        if let Some(rejection) = outcome.rejection() {
            tracing::warn!(at_ms = entry.at_ms, command = ?entry.command, %rejection, "replayed command diverged");
        }
    }
    game.catch_up(log.end_fired, log.end_ms);
    game.take_events();
    game
}
