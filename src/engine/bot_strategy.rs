//! Bot strategy trait.

use serde::{Deserialize, Serialize};

use crate::engine::models::{PlayerId, SquareId};
use crate::games::monopoly::state::GameState;

/// One move an automated seat can make. Each maps onto the same operation a
/// human would invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "move", content = "square", rename_all = "snake_case")]
pub enum BotMove {
    Roll,
    /// Accept the open BUY decision.
    Buy,
    /// Close the open BUY decision without buying.
    Decline,
    /// Close an informational decision (card, jail, upgrade prompt).
    Acknowledge,
    /// Close the BANKRUPT decision and run the game-over check.
    ContinueAfterBankruptcy,
    /// End-of-turn upgrade of one owned square.
    Upgrade(SquareId),
    EndTurn,
}

impl BotMove {
    /// Whether this move answers an open decision.
    pub fn is_decision(&self) -> bool {
        matches!(
            self,
            BotMove::Buy | BotMove::Decline | BotMove::Acknowledge | BotMove::ContinueAfterBankruptcy
        )
    }
}

/// A bot strategy picks the next move for `player` from the current state.
///
/// Returns `None` when the player has nothing to do right now (not their
/// turn, or the engine is busy). Implementations must be deterministic for a
/// given state so games replay exactly.
pub trait BotStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `upgrade_tried` is true once this turn's end-of-turn upgrade has been
    /// made.
    fn choose_move(
        &self,
        state: &GameState,
        player: PlayerId,
        upgrade_tried: bool,
    ) -> Option<BotMove>;
}
