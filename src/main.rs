use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use monopoly_game_engine::engine::bot_profiles::{load_default_profiles, load_profiles};
use monopoly_game_engine::engine::config::{load_config, GameConfigFile};
use monopoly_game_engine::engine::models::{Command, LogKind};
use monopoly_game_engine::engine::replay::{replay, ReplayLog};
use monopoly_game_engine::engine::session::Session;
use monopoly_game_engine::engine::simulator::{run_to_completion, DEFAULT_MAX_TURNS};
use monopoly_game_engine::games::monopoly::ai::BotParams;
use monopoly_game_engine::games::monopoly::types::GamePhase;
use monopoly_game_engine::games::monopoly::{Game, GameState};

#[derive(Parser)]
#[command(name = "monopoly-game-engine", about = "Turn-based property trading game engine")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Play the game described by a TOML config. Human seats read commands
    /// from stdin: roll, end, buy, upgrade, dismiss, vote <id>, leave, state.
    Run {
        /// Path to the game config
        config: PathBuf,

        /// Path to bot_profiles.toml (default: auto-discover)
        #[arg(long, env = "MONOPOLY_BOT_PROFILES")]
        profiles: Option<PathBuf>,

        /// Fast-forward virtual time; only valid when every seat is AI
        #[arg(long)]
        fast: bool,

        /// Abandon a fast game after this many turns
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,

        /// Write the replay log here when the game ends
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Rebuild a game from a replay log and print its standings.
    Replay {
        log: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match Cli::parse().command {
        Mode::Run {
            config,
            profiles,
            fast,
            max_turns,
            save_replay,
        } => {
            let config = load_config(&config)?;
            let params = merged_profiles(profiles.as_deref(), &config)?;
            let seed = config.game.seed.unwrap_or_else(rand::random);
            let game = Game::with_timing(seed, config.timing).with_profiles(params);
            tracing::info!(seed, players = config.players.len(), fast, "starting game");

            let game = if fast {
                if config.has_humans() {
                    return Err("--fast needs every seat to be an AI".into());
                }
                play_fast(game, &config, max_turns)
            } else {
                play_live(game, &config).await?
            };

            print_standings(&game)?;
            if let Some(path) = save_replay {
                game.replay_log().save(&path)?;
                tracing::info!(path = %path.display(), "replay saved");
            }
        }
        Mode::Replay { log } => {
            let log = ReplayLog::load(&log)?;
            tracing::info!(seed = log.seed, entries = log.entries.len(), "replaying");
            let game = replay(&log);
            print_logs(game.state(), 0);
            print_standings(&game)?;
        }
    }

    Ok(())
}

/// Profiles file first, then the config's own `[profiles]` on top.
fn merged_profiles(
    path: Option<&Path>,
    config: &GameConfigFile,
) -> Result<BTreeMap<String, BotParams>, Box<dyn std::error::Error>> {
    let file = match path {
        Some(p) => load_profiles(p).map_err(|e| format!("Failed to load profiles: {e}"))?,
        None => load_default_profiles(),
    };
    let mut params = file.params();
    params.extend(config.profile_params());
    Ok(params)
}

fn play_fast(mut game: Game, config: &GameConfigFile, max_turns: u32) -> Game {
    if let Some(rejection) = game.apply(config.start_command()).rejection() {
        tracing::error!(%rejection, "game did not start");
        return game;
    }
    let outcome = run_to_completion(&mut game, max_turns);
    print_logs(game.state(), 0);
    tracing::info!(
        turns = outcome.turns,
        virtual_ms = outcome.virtual_ms,
        capped = outcome.capped,
        reason = ?outcome.end_reason,
        "game finished"
    );
    game
}

async fn play_live(game: Game, config: &GameConfigFile) -> Result<Game, Box<dyn std::error::Error>> {
    // Zero-delay bots would play out whole turns inside a single clock step.
    if config.timing.bot_roll_ms == 0 && config.players.iter().any(|p| p.is_ai) {
        return Err("live games with AI seats need a non-zero timing.bot_roll_ms; use --fast".into());
    }
    let session = Session::spawn(game, Duration::from_millis(50));
    let mut snapshots = session.watch();

    let printer = tokio::spawn(async move {
        let mut seen = 0;
        while snapshots.changed().await.is_ok() {
            let state = snapshots.borrow_and_update().clone();
            if state.logs.len() < seen {
                seen = 0;
            }
            print_logs(&state, seen);
            seen = state.logs.len();
            if state.game_phase == GamePhase::GameOver {
                break;
            }
        }
    });

    let started = session.send(config.start_command()).await?;
    if let Some(rejection) = started.rejection() {
        return Err(format!("game did not start: {rejection}").into());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = wait_for_end(&session) => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: abandon the game
                    session.send(Command::LeaveGame).await?;
                    break;
                };
                let line = line.trim();
                if line == "state" {
                    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
                    continue;
                }
                match parse_command(line) {
                    Some(command) => {
                        if let Some(rejection) = session.send(command).await?.rejection() {
                            tracing::warn!(%rejection, "command ignored");
                        }
                    }
                    None if line.is_empty() => {}
                    None => tracing::warn!(input = line, "unknown command"),
                }
            }
        }
    }

    let _ = printer.await;
    Ok(session.shutdown().await?)
}

async fn wait_for_end(session: &Session) {
    let mut rx = session.watch();
    let _ = rx
        .wait_for(|s| s.game_phase == GamePhase::GameOver)
        .await;
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "roll" => Command::RollDice,
        "end" => Command::EndTurn,
        "buy" => Command::ConfirmBuy,
        "upgrade" => Command::UpgradeProperty,
        "dismiss" | "ok" => Command::DismissDecision,
        "vote" => Command::VoteToEnd {
            player_id: words.next()?.parse().ok()?,
        },
        "leave" => Command::LeaveGame,
        _ => return None,
    };
    Some(command)
}

fn print_logs(state: &GameState, from: usize) {
    for entry in state.logs.iter().skip(from) {
        match entry.kind {
            LogKind::Error => tracing::warn!(at_ms = entry.timestamp, "{}", entry.text),
            _ => tracing::info!(at_ms = entry.timestamp, "{}", entry.text),
        }
    }
}

fn print_standings(game: &Game) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(&game.rankings())?);
    Ok(())
}
