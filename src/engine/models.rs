//! Core engine data types: identifiers, setup records, the command set,
//! operation outcomes and the cue events emitted to presentation listeners.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::games::monopoly::types::Deck;

pub type PlayerId = u32;
pub type SquareId = usize;
pub type Money = i64;

/// Who makes a seat's decisions. Rules never branch on this; only the bot
/// driver and the vote count do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Ai,
}

/// One seat as produced by a setup/lobby collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default = "default_color")]
    pub color: String,
    /// Named bot profile for AI seats.
    #[serde(default)]
    pub profile: Option<String>,
}

fn default_color() -> String {
    "#ef4444".into()
}

impl PlayerSetup {
    pub fn human(name: &str, color: &str) -> Self {
        Self {
            name: name.into(),
            is_ai: false,
            color: color.into(),
            profile: None,
        }
    }

    pub fn ai(name: &str, color: &str) -> Self {
        Self {
            name: name.into(),
            is_ai: true,
            color: color.into(),
            profile: None,
        }
    }
}

/// Real-time limit of a game. Serialized as minutes with `-1` meaning unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum GameDuration {
    #[default]
    Unlimited,
    Minutes(u32),
}

impl GameDuration {
    pub fn seconds(&self) -> Option<u32> {
        match self {
            GameDuration::Unlimited => None,
            GameDuration::Minutes(m) => Some(m.saturating_mul(60)),
        }
    }
}

impl From<i64> for GameDuration {
    fn from(minutes: i64) -> Self {
        if minutes < 0 {
            GameDuration::Unlimited
        } else {
            GameDuration::Minutes(u32::try_from(minutes).unwrap_or(u32::MAX))
        }
    }
}

impl From<GameDuration> for i64 {
    fn from(d: GameDuration) -> Self {
        match d {
            GameDuration::Unlimited => -1,
            GameDuration::Minutes(m) => i64::from(m),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
    Event,
}

/// An entry of the append-only event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Virtual clock, milliseconds since the engine was created.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At most one solvent player remains.
    Bankruptcy,
    /// The countdown reached zero.
    TimeUp,
    /// A strict majority of human players voted to stop.
    VoteToEnd,
    /// The game was left before any other end condition.
    Abandoned,
}

/// Every input the rules engine accepts. Also the unit of the replay log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    StartGame {
        players: Vec<PlayerSetup>,
        start_money: Money,
        #[serde(default)]
        duration: GameDuration,
    },
    RollDice,
    /// Roll with predetermined faces.
    RollLoaded {
        dice: [u8; 2],
    },
    EndTurn,
    ConfirmBuy,
    UpgradeProperty,
    DismissDecision,
    VoteToEnd {
        player_id: PlayerId,
    },
    LeaveGame,
    ResetToSetup,
}

/// Why an operation declined to act.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("game is not in progress")]
    NotPlaying,
    #[error("game is not in setup")]
    NotInSetup,
    #[error("game is not over")]
    NotFinished,
    #[error("dice already rolled this turn")]
    AlreadyRolled,
    #[error("dice not rolled yet this turn")]
    NotRolled,
    #[error("a roll or move is still animating")]
    Busy,
    #[error("a decision is still open")]
    DecisionOpen,
    #[error("no decision is open")]
    NoDecision,
    #[error("the open decision is of a different kind")]
    WrongDecision,
    #[error("not enough money")]
    InsufficientFunds,
    #[error("square is already owned")]
    AlreadyOwned,
    #[error("square cannot be upgraded by this player")]
    NotUpgradable,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is not a human")]
    NotHuman(PlayerId),
    #[error("die faces must be within 1..=6")]
    InvalidDice,
    #[error("invalid setup: {0}")]
    InvalidSetup(String),
}

/// Result of an operation: applied with the cue events it produced, or a
/// distinguishable no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Vec<GameEvent>),
    Ignored(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Ignored(r) => Some(r),
        }
    }

    pub fn events(&self) -> &[GameEvent] {
        match self {
            Outcome::Applied(events) => events,
            Outcome::Ignored(_) => &[],
        }
    }
}

/// Cue stream for renderers and audio listeners. Carries no state the read
/// projection does not already expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted { players: usize },
    RollStarted { player: PlayerId },
    DiceRolled { player: PlayerId, dice: [u8; 2] },
    Stepped { player: PlayerId, position: SquareId },
    PassedStart { player: PlayerId, salary: Money },
    Landed { player: PlayerId, square: SquareId },
    Purchased { player: PlayerId, square: SquareId, price: Money },
    RentPaid { payer: PlayerId, owner: PlayerId, square: SquareId, amount: Money },
    TaxPaid { player: PlayerId, amount: Money },
    CardDrawn { player: PlayerId, deck: Deck, card_id: u32 },
    SentToJail { player: PlayerId },
    StayedInJail { player: PlayerId, jail_turns: u8 },
    ReleasedFromJail { player: PlayerId, bail_paid: bool },
    Upgraded { player: PlayerId, square: SquareId, houses: u8 },
    Bankrupted { player: PlayerId, beneficiary: Option<PlayerId> },
    TurnStarted { player: PlayerId },
    VoteChanged { player: PlayerId, votes: usize, humans: usize },
    TimerTick { time_left: u32 },
    GameOver { reason: EndReason },
}
