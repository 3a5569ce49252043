//! The mutable game aggregate and its mutation helpers.

use serde::Serialize;

use super::board::initial_squares;
use super::types::*;
use crate::engine::models::{
    EndReason, GameDuration, LogEntry, LogKind, Money, PlayerId, SquareId,
};

/// Everything a renderer reads. Mutated only by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub squares: Vec<Square>,
    /// `None` until the current player's roll settles.
    pub dice_value: Option<[u8; 2]>,
    pub game_phase: GamePhase,
    pub logs: Vec<LogEntry>,
    pub pending_decision: Option<Decision>,
    pub game_duration: GameDuration,
    /// Seconds remaining; `None` when the game is unlimited.
    pub time_left: Option<u32>,
    pub votes_to_end: Vec<PlayerId>,
    pub activity: Activity,
    pub end_reason: Option<EndReason>,
    /// Completed turns since the start.
    pub turn: u32,
}

/// Result of a strict payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payment {
    Paid,
    /// The payer could not cover the amount and handed over what was left.
    Bankrupt { forfeited: Money },
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// A board in the setup phase with no players.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            squares: initial_squares(),
            dice_value: None,
            game_phase: GamePhase::Setup,
            logs: Vec::new(),
            pending_decision: None,
            game_duration: GameDuration::Unlimited,
            time_left: None,
            votes_to_end: Vec::new(),
            activity: Activity::Idle,
            end_reason: None,
            turn: 0,
        }
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub fn human_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_ai()).count()
    }

    pub fn is_idle(&self) -> bool {
        self.activity == Activity::Idle
    }

    /// True when every square of `group` is owned by `player`. `assume_owned`
    /// is counted as owned regardless of its real owner, which answers
    /// "would buying this complete the group".
    pub fn check_monopoly(
        &self,
        group: Option<ColorGroup>,
        player: PlayerId,
        assume_owned: Option<SquareId>,
    ) -> bool {
        let Some(group) = group else {
            return false;
        };
        self.squares
            .iter()
            .filter(|s| s.color_group == Some(group))
            .all(|s| Some(s.id) == assume_owned || s.owner == Some(player))
    }

    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Square> {
        self.squares.iter().filter(move |s| s.owner == Some(player))
    }

    pub fn property_value(&self, player: PlayerId) -> Money {
        self.owned_by(player).map(Square::asset_value).sum()
    }

    pub fn total_wealth(&self, player: &Player) -> Money {
        player.money + self.property_value(player.id)
    }

    pub fn push_log(&mut self, text: impl Into<String>, kind: LogKind, timestamp: u64) {
        self.logs.push(LogEntry {
            text: text.into(),
            kind,
            timestamp,
        });
    }

    // ------------------------------------------------------------------ //
    //  Money movement
    // ------------------------------------------------------------------ //

    /// Strict payment: the payer never goes negative. If the balance does
    /// not cover `amount`, the whole balance goes to the beneficiary (or
    /// nowhere), the payer is zeroed and flagged bankrupt.
    ///
    /// `payer` is an index into `players`.
    pub fn charge(
        &mut self,
        payer: usize,
        amount: Money,
        beneficiary: Option<PlayerId>,
    ) -> Payment {
        let balance = self.players[payer].money;
        let (transferred, outcome) = if balance < amount {
            self.players[payer].money = 0;
            self.players[payer].is_bankrupt = true;
            let forfeited = balance.max(0);
            (forfeited, Payment::Bankrupt { forfeited })
        } else {
            self.players[payer].money -= amount;
            (amount, Payment::Paid)
        };
        if let Some(idx) = beneficiary.and_then(|id| self.player_index(id)) {
            self.players[idx].money += transferred;
        }
        outcome
    }

    pub fn credit(&mut self, player: usize, amount: Money) {
        self.players[player].money += amount;
    }

    /// Unchecked transfer of an amount the caller already clamped.
    pub fn transfer(&mut self, from: usize, to: usize, amount: Money) {
        self.players[from].money -= amount;
        self.players[to].money += amount;
    }

    pub fn send_to_jail(&mut self, player: usize) {
        let p = &mut self.players[player];
        p.position = JAIL_POSITION;
        p.in_jail = true;
    }

    /// Index of the next solvent seat after the current one. The scan is
    /// bounded by the seat count, so with nobody else solvent it stops on
    /// whichever seat it reached.
    pub fn next_player_index(&self) -> usize {
        let n = self.players.len();
        if n == 0 {
            return 0;
        }
        let mut next = (self.current_player_index + 1) % n;
        let mut scanned = 0;
        while self.players[next].is_bankrupt && scanned < n {
            next = (next + 1) % n;
            scanned += 1;
        }
        next
    }
}
