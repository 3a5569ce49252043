//! Bot-vs-bot arena runner: plays many all-AI games between named threshold
//! profiles and aggregates wins and wealth per profile.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use rayon::prelude::*;

use crate::engine::models::{Money, PlayerSetup};
use crate::engine::simulator::{simulate_ai_game, SimulationOutcome};
use crate::games::monopoly::ai::BotParams;

const SEAT_COLORS: [&str; 6] = ["#ef4444", "#3b82f6", "#22c55e", "#eab308", "#a855f7", "#f97316"];

/// Aggregated results from an arena run.
pub struct ArenaResult {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    /// Games whose top two standings had the same total wealth.
    pub draws: usize,
    /// Games abandoned at the turn cap. They still count toward wins.
    pub capped: usize,
    pub total_wealth: HashMap<String, Vec<f64>>,
    pub turns: Vec<u32>,
    pub game_durations_ms: Vec<f64>,
}

impl ArenaResult {
    fn empty(names: &[String], num_games: usize) -> Self {
        Self {
            num_games,
            wins: names.iter().map(|n| (n.clone(), 0)).collect(),
            draws: 0,
            capped: 0,
            total_wealth: names.iter().map(|n| (n.clone(), Vec::new())).collect(),
            turns: Vec::with_capacity(num_games),
            game_durations_ms: Vec::with_capacity(num_games),
        }
    }

    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_wealth(&self, name: &str) -> f64 {
        match self.total_wealth.get(name) {
            Some(w) if !w.is_empty() => w.iter().sum::<f64>() / w.len() as f64,
            _ => 0.0,
        }
    }

    pub fn wealth_stddev(&self, name: &str) -> f64 {
        let wealth = match self.total_wealth.get(name) {
            Some(w) if w.len() >= 2 => w,
            _ => return 0.0,
        };
        let avg = self.avg_wealth(name);
        let variance =
            wealth.iter().map(|w| (w - avg).powi(2)).sum::<f64>() / (wealth.len() - 1) as f64;
        variance.sqrt()
    }

    pub fn avg_turns(&self) -> f64 {
        if self.turns.is_empty() {
            return 0.0;
        }
        self.turns.iter().map(|&t| t as f64).sum::<f64>() / self.turns.len() as f64
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        let mut names: Vec<&String> = self.wins.keys().collect();
        names.sort();
        for name in names {
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  wealth={:7.0} +/- {:6.0}",
                name,
                self.wins[name],
                self.win_rate(name) * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
                self.avg_wealth(name),
                self.wealth_stddev(name),
            ));
        }
        lines.push(format!("  {:>12}: {}", "Draws", self.draws));
        lines.push(format!("  {:>12}: {}", "Capped", self.capped));
        lines.push(format!("  Avg turns: {:.1}", self.avg_turns()));
        if !self.game_durations_ms.is_empty() {
            let total_ms = self.game_durations_ms.iter().sum::<f64>();
            lines.push(format!(
                "  Avg game: {:.1}ms  |  Total: {:.1}s",
                total_ms / self.game_durations_ms.len() as f64,
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }
}

/// Options of one arena run.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub num_games: usize,
    pub base_seed: u64,
    pub start_money: Money,
    pub max_turns: u32,
    /// Rotate profiles through the seats from game to game.
    pub alternate_seats: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_games: 100,
            base_seed: 42,
            start_money: 1500,
            max_turns: 500,
            alternate_seats: true,
        }
    }
}

struct GameRecord {
    /// Profile name per seat.
    seats: Vec<String>,
    outcome: SimulationOutcome,
    elapsed_ms: f64,
}

/// Seat assignment for game `game_idx`: one seat per profile.
pub fn seat_assignment(names: &[String], game_idx: usize, alternate: bool) -> Vec<String> {
    let n = names.len();
    if alternate && n > 0 {
        (0..n).map(|i| names[(i + game_idx) % n].clone()).collect()
    } else {
        names.to_vec()
    }
}

/// Run `config.num_games` games between `profiles`, one seat per profile.
/// Games run in parallel; aggregation happens in game order so results do
/// not depend on the thread count.
pub fn run_arena(
    profiles: &[(String, BotParams)],
    config: &ArenaConfig,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult {
    let names: Vec<String> = profiles.iter().map(|(n, _)| n.clone()).collect();
    let table: BTreeMap<String, BotParams> = profiles.iter().cloned().collect();
    let done = std::sync::atomic::AtomicUsize::new(0);

    let records: Vec<GameRecord> = (0..config.num_games)
        .into_par_iter()
        .map(|game_idx| {
            let seats = seat_assignment(&names, game_idx, config.alternate_seats);
            let players = seats
                .iter()
                .enumerate()
                .map(|(i, profile)| PlayerSetup {
                    profile: Some(profile.clone()),
                    ..PlayerSetup::ai(profile, SEAT_COLORS[i % SEAT_COLORS.len()])
                })
                .collect();

            let t0 = Instant::now();
            let (_, outcome) = simulate_ai_game(
                players,
                config.start_money,
                config.base_seed + game_idx as u64,
                table.clone(),
                config.max_turns,
            );
            let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

            if let Some(cb) = progress {
                let finished = done.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
                cb(finished, config.num_games);
            }
            GameRecord {
                seats,
                outcome,
                elapsed_ms,
            }
        })
        .collect();

    let mut result = ArenaResult::empty(&names, config.num_games);
    for record in records {
        tally(&mut result, record);
    }
    result
}

fn tally(result: &mut ArenaResult, record: GameRecord) {
    let GameRecord {
        seats,
        outcome,
        elapsed_ms,
    } = record;
    result.game_durations_ms.push(elapsed_ms);
    result.turns.push(outcome.turns);
    if outcome.capped {
        result.capped += 1;
    }

    // Player ids are 1-based seat numbers.
    let profile_of = |player_id: u32| {
        (player_id as usize).checked_sub(1).and_then(|i| seats.get(i))
    };
    for standing in &outcome.standings {
        if let Some(name) = profile_of(standing.player_id) {
            if let Some(w) = result.total_wealth.get_mut(name) {
                w.push(standing.total_wealth as f64);
            }
        }
    }

    match outcome.standings.as_slice() {
        [first, second, ..] if first.total_wealth == second.total_wealth => result.draws += 1,
        [first, ..] => {
            if let Some(wins) = profile_of(first.player_id).and_then(|n| result.wins.get_mut(n)) {
                *wins += 1;
            }
        }
        [] => result.draws += 1,
    }
}
