//! Threshold-driven computer player.
//!
//! Stateless per decision: every answer is a function of the game state and
//! the thresholds in [`BotParams`]. The only per-turn memory, whether the
//! end-of-turn upgrade already happened, is kept by the engine and passed in.

use serde::{Deserialize, Serialize};

use super::state::GameState;
use super::types::*;
use crate::engine::bot_strategy::{BotMove, BotStrategy};
use crate::engine::models::{Money, PlayerId, SquareId};

/// Cash thresholds of the computer player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotParams {
    /// Reserve kept when a purchase completes (or belongs to) a monopoly.
    pub monopoly_buffer: Money,
    /// Reserve kept when few players remain.
    pub endgame_buffer: Money,
    pub default_buffer: Money,
    /// Reserve kept after upgrading a monopoly square or in the endgame.
    pub upgrade_reserve_safe: Money,
    pub upgrade_reserve_default: Money,
    /// Active player count at or below which the endgame thresholds apply.
    pub endgame_players: usize,
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            monopoly_buffer: 50,
            endgame_buffer: 150,
            default_buffer: 300,
            upgrade_reserve_safe: 150,
            upgrade_reserve_default: 500,
            endgame_players: 2,
        }
    }
}

pub struct ThresholdBot {
    pub params: BotParams,
    name: String,
}

impl Default for ThresholdBot {
    fn default() -> Self {
        Self::new(BotParams::default())
    }
}

impl ThresholdBot {
    pub fn new(params: BotParams) -> Self {
        Self {
            params,
            name: "threshold".into(),
        }
    }

    pub fn named(name: impl Into<String>, params: BotParams) -> Self {
        Self {
            params,
            name: name.into(),
        }
    }

    fn is_endgame(&self, state: &GameState) -> bool {
        state.active_count() <= self.params.endgame_players
    }

    /// Cash the player must still hold after buying `square_id`.
    pub fn buy_buffer(&self, state: &GameState, player: PlayerId, square_id: SquareId) -> Money {
        let group = state.squares.get(square_id).and_then(|s| s.color_group);
        if state.check_monopoly(group, player, Some(square_id)) {
            self.params.monopoly_buffer
        } else if self.is_endgame(state) {
            self.params.endgame_buffer
        } else {
            self.params.default_buffer
        }
    }

    pub fn should_buy(&self, state: &GameState, player: &Player, square_id: SquareId, price: Money) -> bool {
        let buffer = self.buy_buffer(state, player.id, square_id);
        player.money >= price && player.money >= price + buffer
    }

    /// The square to upgrade at the end of the turn, if any.
    ///
    /// Monopoly squares come first, then larger marginal rent gain. Seat
    /// order of the board breaks remaining ties.
    pub fn pick_upgrade(&self, state: &GameState, player: &Player) -> Option<SquareId> {
        let mut candidates: Vec<(&Square, bool)> = state
            .owned_by(player.id)
            .filter(|s| s.is_upgradable())
            .map(|s| (s, state.check_monopoly(s.color_group, player.id, None)))
            .collect();
        candidates.sort_by(|(a, a_mono), (b, b_mono)| {
            b_mono
                .cmp(a_mono)
                .then_with(|| b.rent_gain().cmp(&a.rent_gain()))
        });

        let endgame = self.is_endgame(state);
        candidates.into_iter().find_map(|(sq, mono)| {
            let reserve = if mono || endgame {
                self.params.upgrade_reserve_safe
            } else {
                self.params.upgrade_reserve_default
            };
            (player.money >= sq.house_cost + reserve).then_some(sq.id)
        })
    }
}

impl BotStrategy for ThresholdBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(
        &self,
        state: &GameState,
        player: PlayerId,
        upgrade_tried: bool,
    ) -> Option<BotMove> {
        if state.game_phase != GamePhase::Playing {
            return None;
        }
        let me = state.current_player().filter(|p| p.id == player)?;

        if let Some(decision) = &state.pending_decision {
            return Some(match decision {
                Decision::Buy { square_id, price, .. } => {
                    if self.should_buy(state, me, *square_id, *price) {
                        BotMove::Buy
                    } else {
                        BotMove::Decline
                    }
                }
                Decision::Bankrupt { .. } => BotMove::ContinueAfterBankruptcy,
                _ => BotMove::Acknowledge,
            });
        }
        if !state.is_idle() {
            return None;
        }
        if state.dice_value.is_none() {
            return Some(BotMove::Roll);
        }
        if !upgrade_tried && !me.is_bankrupt {
            if let Some(square) = self.pick_upgrade(state, me) {
                return Some(BotMove::Upgrade(square));
            }
        }
        Some(BotMove::EndTurn)
    }
}
