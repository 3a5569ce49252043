//! Landing resolution.
//!
//! [`resolve_landing`] is pure: it reads the state and produces a
//! [`Resolution`] (effects to apply plus at most one decision). The game
//! applies it afterwards. Card draws happen before resolution so the
//! resolver itself never touches randomness.

use super::cards::resolve_card;
use super::state::GameState;
use super::types::*;
use crate::engine::models::{LogKind, Money, PlayerId, SquareId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeReason {
    Rent { square: SquareId },
    Tax,
    Card,
    PayEveryone,
}

/// One state change produced by a landing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Strict payment, may bankrupt the payer.
    Charge {
        payer: PlayerId,
        amount: Money,
        beneficiary: Option<PlayerId>,
        reason: ChargeReason,
    },
    Credit {
        player: PlayerId,
        amount: Money,
    },
    /// Amount already clamped to what `from` holds.
    Transfer {
        from: PlayerId,
        to: PlayerId,
        amount: Money,
    },
    MoveTo {
        player: PlayerId,
        position: SquareId,
        salary: Money,
    },
    SendToJail {
        player: PlayerId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub player: PlayerId,
    pub square: SquareId,
    pub effects: Vec<Effect>,
    pub decision: Option<Decision>,
    pub log: Option<(String, LogKind)>,
}

impl Resolution {
    pub fn new(player: PlayerId, square: SquareId) -> Self {
        Self {
            player,
            square,
            effects: Vec::new(),
            decision: None,
            log: None,
        }
    }

    pub fn is_bankrupting(&self) -> bool {
        matches!(self.decision, Some(Decision::Bankrupt { .. }))
    }

    /// Queue a strict payment from `payer`. Returns whether it is covered;
    /// when it is not, the bankruptcy decision and log are set here.
    pub(crate) fn charge(
        &mut self,
        payer: &Player,
        amount: Money,
        beneficiary: Option<PlayerId>,
        reason: ChargeReason,
    ) -> bool {
        self.effects.push(Effect::Charge {
            payer: payer.id,
            amount,
            beneficiary,
            reason,
        });
        if payer.money < amount {
            self.decision = Some(Decision::Bankrupt {
                player_id: payer.id,
                owed: amount,
            });
            self.log = Some((format!("{} went bankrupt!", payer.name), LogKind::Error));
            false
        } else {
            true
        }
    }

    fn note(&mut self, text: String) {
        self.log = Some((text, LogKind::Event));
    }
}

/// Work out what landing on `square_id` means for the current player.
///
/// `card` is the card drawn for chance/community squares; other squares
/// ignore it.
pub fn resolve_landing(
    state: &GameState,
    square_id: SquareId,
    dice_sum: u32,
    card: Option<&Card>,
) -> Resolution {
    let Some(player) = state.current_player() else {
        return Resolution::new(0, square_id);
    };
    let mut res = Resolution::new(player.id, square_id);
    let Some(square) = state.squares.get(square_id) else {
        return res;
    };

    match square.kind {
        SquareKind::Property | SquareKind::Utility => match square.owner {
            None => {
                res.decision = Some(Decision::Buy {
                    square_id,
                    name: square.name.clone(),
                    price: square.price,
                });
            }
            Some(owner_id) if owner_id != player.id => {
                let owner_name = state
                    .player(owner_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                if square.is_mortgaged {
                    res.note(format!(
                        "{} landed on {}, but it is mortgaged. No rent.",
                        player.name, square.name
                    ));
                } else {
                    let rent = match square.kind {
                        SquareKind::Property => square.current_rent(),
                        _ => UTILITY_RENT_MULTIPLIER * Money::from(dice_sum),
                    };
                    let reason = ChargeReason::Rent { square: square_id };
                    if res.charge(player, rent, Some(owner_id), reason) {
                        res.note(format!(
                            "{} paid {} rent of {} at {}.",
                            player.name, owner_name, rent, square.name
                        ));
                    }
                }
            }
            Some(_) => {
                if square.is_upgradable() && player.money >= square.house_cost {
                    res.decision = Some(Decision::Upgrade {
                        square_id,
                        name: square.name.clone(),
                        cost: square.house_cost,
                    });
                }
            }
        },
        SquareKind::Chance | SquareKind::Community => {
            let deck = if square.kind == SquareKind::Chance {
                Deck::Chance
            } else {
                Deck::Community
            };
            if let Some(card) = card {
                resolve_card(state, player, square, deck, card, &mut res);
            }
        }
        SquareKind::Tax => {
            if res.charge(player, square.price, None, ChargeReason::Tax) {
                res.note(format!("{} paid tax of {}.", player.name, square.price));
            }
        }
        SquareKind::GoToJail => {
            res.effects.push(Effect::SendToJail { player: player.id });
            res.note(format!("{} was sent to jail!", player.name));
            res.decision = Some(Decision::Info {
                title: "Arrested!".into(),
                message: "You have been sent to jail.".into(),
            });
        }
        SquareKind::Start | SquareKind::Jail | SquareKind::Rest => {}
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::monopoly::state::tests::playing_state;

    fn at(state: &mut GameState, idx: usize, pos: SquareId) {
        state.current_player_index = idx;
        state.players[idx].position = pos;
    }

    #[test]
    fn unowned_property_opens_buy() {
        let mut s = playing_state(&[1500, 1500, 1500, 1500]);
        at(&mut s, 0, 1);
        let res = resolve_landing(&s, 1, 1, None);
        assert_eq!(
            res.decision,
            Some(Decision::Buy { square_id: 1, name: "Puran Dhaka".into(), price: 60 })
        );
        assert!(res.effects.is_empty());
    }

    #[test]
    fn rent_follows_house_count() {
        let mut s = playing_state(&[1500, 1500]);
        s.squares[39].owner = Some(2);
        s.squares[39].houses = 3;
        at(&mut s, 0, 39);
        let res = resolve_landing(&s, 39, 7, None);
        assert_eq!(
            res.effects,
            vec![Effect::Charge {
                payer: 1,
                amount: 1400,
                beneficiary: Some(2),
                reason: ChargeReason::Rent { square: 39 },
            }]
        );
        assert!(res.decision.is_none());
    }

    #[test]
    fn utility_rent_is_four_times_dice() {
        let mut s = playing_state(&[1500, 1500]);
        s.squares[12].owner = Some(2);
        at(&mut s, 0, 12);
        let res = resolve_landing(&s, 12, 9, None);
        assert!(matches!(res.effects[0], Effect::Charge { amount: 36, .. }));
    }

    #[test]
    fn mortgaged_square_charges_nothing() {
        let mut s = playing_state(&[1500, 1500]);
        s.squares[6].owner = Some(2);
        s.squares[6].is_mortgaged = true;
        at(&mut s, 0, 6);
        let res = resolve_landing(&s, 6, 6, None);
        assert!(res.effects.is_empty());
        assert!(res.log.is_some());
    }

    #[test]
    fn unaffordable_rent_raises_bankruptcy() {
        let mut s = playing_state(&[10, 1500]);
        s.squares[39].owner = Some(2);
        at(&mut s, 0, 39);
        let res = resolve_landing(&s, 39, 4, None);
        assert_eq!(res.decision, Some(Decision::Bankrupt { player_id: 1, owed: 50 }));
        assert_eq!(res.log.as_ref().map(|l| l.1), Some(LogKind::Error));
    }

    #[test]
    fn own_property_offers_upgrade_only_when_affordable() {
        let mut s = playing_state(&[100, 1500]);
        s.squares[11].owner = Some(1);
        at(&mut s, 0, 11);
        assert!(matches!(
            resolve_landing(&s, 11, 1, None).decision,
            Some(Decision::Upgrade { cost: 100, .. })
        ));
        s.players[0].money = 99;
        assert!(resolve_landing(&s, 11, 1, None).decision.is_none());
        s.players[0].money = 1000;
        s.squares[11].houses = HOTEL;
        assert!(resolve_landing(&s, 11, 1, None).decision.is_none());
    }

    #[test]
    fn own_utility_is_a_no_op() {
        let mut s = playing_state(&[1500, 1500]);
        s.squares[5].owner = Some(1);
        at(&mut s, 0, 5);
        let res = resolve_landing(&s, 5, 5, None);
        assert!(res.decision.is_none());
        assert!(res.effects.is_empty());
    }

    #[test]
    fn tax_is_paid_to_nobody() {
        let mut s = playing_state(&[1500, 1500]);
        at(&mut s, 0, 4);
        let res = resolve_landing(&s, 4, 4, None);
        assert_eq!(
            res.effects,
            vec![Effect::Charge { payer: 1, amount: 200, beneficiary: None, reason: ChargeReason::Tax }]
        );
    }

    #[test]
    fn go_to_jail_opens_info() {
        let mut s = playing_state(&[1500, 1500]);
        at(&mut s, 1, 30);
        let res = resolve_landing(&s, 30, 8, None);
        assert_eq!(res.effects, vec![Effect::SendToJail { player: 2 }]);
        assert!(matches!(res.decision, Some(Decision::Info { .. })));
    }

    #[test]
    fn plain_squares_do_nothing() {
        let mut s = playing_state(&[1500, 1500]);
        for pos in [0, 10, 20] {
            at(&mut s, 0, pos);
            let res = resolve_landing(&s, pos, 5, None);
            assert!(res.effects.is_empty() && res.decision.is_none() && res.log.is_none());
        }
    }
}
