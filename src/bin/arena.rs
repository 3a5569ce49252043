//! Arena CLI: run bot-vs-bot experiments from the command line.
//!
//! Usage:
//!   cargo run --release --bin arena -- --games 200 --p1-profile hard --p2-profile easy
//!   cargo run --release --bin arena -- --games 50 --p1-default-buffer 100 --p2-default-buffer 600 --players 4

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use monopoly_game_engine::engine::arena::{run_arena, ArenaConfig};
use monopoly_game_engine::engine::bot_profiles::{load_default_profiles, load_profiles, BotProfilesFile};
use monopoly_game_engine::engine::models::Money;
use monopoly_game_engine::games::monopoly::ai::BotParams;

#[derive(Parser)]
#[command(name = "arena", about = "Run bot-vs-bot arena experiments")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Random seed of the first game; game i uses seed + i
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Rotate seat positions between games
    #[arg(long, default_value = "true")]
    alternate_seats: bool,

    /// Path to bot_profiles.toml
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Seats per game; profiles alternate p1, p2, p1, ...
    #[arg(long, default_value = "2")]
    players: usize,

    #[arg(long, default_value = "1500")]
    start_money: Money,

    /// Abandon a game after this many turns
    #[arg(long, default_value = "500")]
    max_turns: u32,

    // --- Player 1 ---
    /// P1 display name
    #[arg(long, default_value = "p1")]
    p1_name: String,

    /// P1 profile name (from bot_profiles.toml)
    #[arg(long)]
    p1_profile: Option<String>,

    /// P1 reserve kept when buying outside a monopoly
    #[arg(long)]
    p1_default_buffer: Option<Money>,

    /// P1 reserve kept when a purchase completes a monopoly
    #[arg(long)]
    p1_monopoly_buffer: Option<Money>,

    /// P1 reserve kept after an upgrade
    #[arg(long)]
    p1_upgrade_reserve: Option<Money>,

    // --- Player 2 ---
    /// P2 display name
    #[arg(long, default_value = "p2")]
    p2_name: String,

    /// P2 profile name (from bot_profiles.toml)
    #[arg(long)]
    p2_profile: Option<String>,

    #[arg(long)]
    p2_default_buffer: Option<Money>,

    #[arg(long)]
    p2_monopoly_buffer: Option<Money>,

    #[arg(long)]
    p2_upgrade_reserve: Option<Money>,
}

struct PlayerConfig {
    name: String,
    params: BotParams,
}

fn build_player_config(
    name: &str,
    profile_name: Option<&str>,
    default_buffer: Option<Money>,
    monopoly_buffer: Option<Money>,
    upgrade_reserve: Option<Money>,
    profiles: &BotProfilesFile,
) -> PlayerConfig {
    let (display_name, mut params) = match profile_name {
        Some(prof_name) => {
            // Accept difficulty tiers ("easy", "hard", ...) as well as profile names.
            let profile = profiles
                .profiles
                .get(prof_name)
                .or_else(|| {
                    let resolved = profiles.production.resolve(prof_name)?;
                    profiles.profiles.get(resolved)
                })
                .unwrap_or_else(|| {
                    eprintln!("Error: profile '{}' not found in bot_profiles.toml", prof_name);
                    eprintln!("Available profiles: {:?}", profiles.profiles.keys().collect::<Vec<_>>());
                    std::process::exit(1);
                });
            let display_name = if name == "p1" || name == "p2" {
                prof_name.to_string()
            } else {
                name.to_string()
            };
            (display_name, profile.to_params())
        }
        None => (name.to_string(), BotParams::default()),
    };

    // CLI overrides on top of profile
    if let Some(v) = default_buffer { params.default_buffer = v; }
    if let Some(v) = monopoly_buffer { params.monopoly_buffer = v; }
    if let Some(v) = upgrade_reserve { params.upgrade_reserve_default = v; }

    PlayerConfig {
        name: display_name,
        params,
    }
}

fn print_config(config: &PlayerConfig) {
    let p = &config.params;
    eprintln!(
        "  {}: buffers default={} monopoly={} endgame={}, upgrade reserve={}/{}, endgame at {} players",
        config.name,
        p.default_buffer,
        p.monopoly_buffer,
        p.endgame_buffer,
        p.upgrade_reserve_default,
        p.upgrade_reserve_safe,
        p.endgame_players,
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    if !(2..=6).contains(&cli.players) {
        eprintln!("Error: --players must be between 2 and 6");
        std::process::exit(1);
    }

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path).unwrap_or_else(|e| {
            eprintln!("Error loading profiles: {}", e);
            std::process::exit(1);
        }),
        None => load_default_profiles(),
    };

    let p1 = build_player_config(
        &cli.p1_name, cli.p1_profile.as_deref(),
        cli.p1_default_buffer, cli.p1_monopoly_buffer, cli.p1_upgrade_reserve,
        &profiles,
    );
    let mut p2 = build_player_config(
        &cli.p2_name, cli.p2_profile.as_deref(),
        cli.p2_default_buffer, cli.p2_monopoly_buffer, cli.p2_upgrade_reserve,
        &profiles,
    );
    if p2.name == p1.name {
        p2.name = format!("{}-2", p2.name);
    }

    eprintln!(
        "Arena: {} games, {} players, seed={}, alternate_seats={}",
        cli.games, cli.players, cli.seed, cli.alternate_seats
    );
    print_config(&p1);
    print_config(&p2);
    eprintln!();

    // One entry per seat; extra seats alternate between the two configs.
    let seats: Vec<(String, BotParams)> = (0..cli.players)
        .map(|i| {
            let c = if i % 2 == 0 { &p1 } else { &p2 };
            let name = if i < 2 { c.name.clone() } else { format!("{}#{}", c.name, i / 2 + 1) };
            (name, c.params)
        })
        .collect();

    let total = cli.games;
    let progress_cb = move |done: usize, _total: usize| {
        eprint!("\r  [{}/{}] games completed", done, total);
    };

    let config = ArenaConfig {
        num_games: cli.games,
        base_seed: cli.seed,
        start_money: cli.start_money,
        max_turns: cli.max_turns,
        alternate_seats: cli.alternate_seats,
    };
    let result = run_arena(&seats, &config, Some(&progress_cb));

    eprintln!("\r                                    "); // clear progress line
    println!("{}", result.summary());
}
