//! Board, card, player and decision types.

use serde::{Deserialize, Serialize};

use crate::engine::models::{Controller, Money, PlayerId, SquareId};

pub const BOARD_SIZE: usize = 40;
pub const JAIL_POSITION: SquareId = 10;
pub const START_SALARY: Money = 200;
pub const JAIL_FINE: Money = 50;
pub const MAX_JAIL_TURNS: u8 = 3;
/// House count that stands for a hotel; no further upgrades.
pub const HOTEL: u8 = 5;
pub const UTILITY_RENT_MULTIPLIER: Money = 4;
/// Per-opponent amount of the pay-all / collect-from-all cards.
pub const GROUP_CARD_AMOUNT: Money = 10;
/// Card move value meaning "advance to start and collect salary".
pub const ADVANCE_TO_START: i32 = 40;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const DEFAULT_START_MONEY: Money = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SquareKind {
    Start,
    Property,
    Chance,
    Community,
    Jail,
    /// Plain resting square. Landing on it does nothing.
    Rest,
    GoToJail,
    Tax,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorGroup {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub id: SquareId,
    pub name: String,
    pub kind: SquareKind,
    /// Purchase cost, or the amount due on a tax square.
    pub price: Money,
    /// Rent by house count, index 5 is the hotel.
    pub rent: [Money; 6],
    pub house_cost: Money,
    /// `None` for squares outside every group.
    pub color_group: Option<ColorGroup>,
    pub owner: Option<PlayerId>,
    pub houses: u8,
    pub is_mortgaged: bool,
}

impl Square {
    pub fn is_purchasable(&self) -> bool {
        matches!(self.kind, SquareKind::Property | SquareKind::Utility)
    }

    pub fn is_upgradable(&self) -> bool {
        self.kind == SquareKind::Property && self.houses < HOTEL
    }

    pub fn current_rent(&self) -> Money {
        self.rent[usize::from(self.houses.min(HOTEL))]
    }

    /// Rent increase the next upgrade would bring; zero at hotel level.
    pub fn rent_gain(&self) -> Money {
        if self.houses >= HOTEL {
            return 0;
        }
        let h = usize::from(self.houses);
        self.rent[h + 1] - self.rent[h]
    }

    /// Valuation used by winner ranking.
    pub fn asset_value(&self) -> Money {
        let mut value = self.price + Money::from(self.houses) * self.house_cost;
        if self.is_mortgaged {
            value -= self.price / 2;
        }
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deck {
    Chance,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardAction {
    GoToJail,
    /// Kept as a no-op: no card inventory is tracked.
    GetOutOfJail,
    PayAll10,
    CollectAll10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardEffect {
    /// Signed money delta.
    Amount(Money),
    /// Relative move, or [`ADVANCE_TO_START`].
    Move(i32),
    Action(CardAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: u32,
    pub text: &'static str,
    pub effect: CardEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub controller: Controller,
    pub money: Money,
    pub position: SquareId,
    pub is_bankrupt: bool,
    pub in_jail: bool,
    pub jail_turns: u8,
}

impl Player {
    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    pub fn is_active(&self) -> bool {
        !self.is_bankrupt
    }
}

/// The single pending-decision slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Buy {
        square_id: SquareId,
        name: String,
        price: Money,
    },
    Upgrade {
        square_id: SquareId,
        name: String,
        cost: Money,
    },
    Chance {
        card_id: u32,
        title: String,
        text: String,
    },
    Community {
        card_id: u32,
        title: String,
        text: String,
    },
    Info {
        title: String,
        message: String,
    },
    Bankrupt {
        player_id: PlayerId,
        owed: Money,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Setup,
    Playing,
    GameOver,
}

/// Busy states of the turn. Both suppress new rolls and turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    Rolling,
    Moving,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(houses: u8) -> Square {
        Square {
            id: 1,
            name: "Test".into(),
            kind: SquareKind::Property,
            price: 60,
            rent: [2, 10, 30, 90, 160, 250],
            house_cost: 50,
            color_group: Some(ColorGroup::Brown),
            owner: Some(1),
            houses,
            is_mortgaged: false,
        }
    }

    #[test]
    fn rent_gain_is_marginal() {
        assert_eq!(property(0).rent_gain(), 8);
        assert_eq!(property(3).rent_gain(), 70);
        assert_eq!(property(HOTEL).rent_gain(), 0);
    }

    #[test]
    fn asset_value_discounts_mortgage() {
        let mut sq = property(2);
        assert_eq!(sq.asset_value(), 60 + 2 * 50);
        sq.is_mortgaged = true;
        assert_eq!(sq.asset_value(), 60 + 2 * 50 - 30);
    }

    #[test]
    fn decision_tag_is_upper_case() {
        let d = Decision::Buy { square_id: 1, name: "x".into(), price: 60 };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "BUY");
        assert_eq!(json["price"], 60);
    }
}
