//! Synchronous simulator: fast-forwards a game through its scheduled entries.
//! Used by the arena, the `--fast` CLI mode and the benches.

use std::collections::BTreeMap;

use crate::engine::config::Timing;
use crate::engine::models::{EndReason, GameDuration, Money, PlayerSetup};
use crate::games::monopoly::ai::BotParams;
use crate::games::monopoly::{Game, Standing};

/// Turn cap used when the caller does not pick one.
pub const DEFAULT_MAX_TURNS: u32 = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    /// `None` when the game stopped to wait on a human.
    pub end_reason: Option<EndReason>,
    pub standings: Vec<Standing>,
    pub turns: u32,
    pub virtual_ms: u64,
    /// The turn cap was reached and the game was abandoned.
    pub capped: bool,
}

/// Settle `game` until it is over, waits on a human, or has played
/// `max_turns` turns. A capped game is left through the normal leave
/// operation so it still has standings.
pub fn run_to_completion(game: &mut Game, max_turns: u32) -> SimulationOutcome {
    game.settle_while(|s| s.turn < max_turns);

    let capped = !game.is_over() && game.state().turn >= max_turns;
    if capped {
        tracing::debug!(turns = game.state().turn, "turn cap reached, abandoning game");
        game.leave_game();
    }

    SimulationOutcome {
        end_reason: game.state().end_reason,
        standings: game.rankings(),
        turns: game.state().turn,
        virtual_ms: game.now_ms(),
        capped,
    }
}

/// Play one all-AI game with instant timing.
pub fn simulate_ai_game(
    players: Vec<PlayerSetup>,
    start_money: Money,
    seed: u64,
    profiles: BTreeMap<String, BotParams>,
    max_turns: u32,
) -> (Game, SimulationOutcome) {
    let mut game = Game::with_timing(seed, Timing::instant()).with_profiles(profiles);
    let started = game.start_game(players, start_money, GameDuration::Unlimited);
    if let Some(rejection) = started.rejection() {
        tracing::warn!(%rejection, "simulated game did not start");
    }
    let outcome = run_to_completion(&mut game, max_turns);
    (game, outcome)
}
