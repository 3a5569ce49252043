//! Card effects.

use rand::seq::SliceRandom;
use rand::Rng;

use super::board::deck;
use super::landing::{ChargeReason, Effect, Resolution};
use super::state::GameState;
use super::types::*;
use crate::engine::models::{LogKind, Money};

/// Draw uniformly with replacement; decks never shrink.
pub fn draw<R: Rng + ?Sized>(kind: Deck, rng: &mut R) -> Option<&'static Card> {
    deck(kind).choose(rng)
}

/// Destination and salary of a card move from `position`.
pub fn card_destination(position: usize, delta: i32) -> (usize, Money) {
    if delta == ADVANCE_TO_START {
        return (0, START_SALARY);
    }
    let size = BOARD_SIZE as i64;
    let raw = position as i64 + i64::from(delta);
    if raw >= size {
        ((raw % size) as usize, START_SALARY)
    } else if raw < 0 {
        (raw.rem_euclid(size) as usize, 0)
    } else {
        (raw as usize, 0)
    }
}

pub(crate) fn resolve_card(
    state: &GameState,
    player: &Player,
    square: &Square,
    kind: Deck,
    card: &Card,
    res: &mut Resolution,
) {
    match card.effect {
        CardEffect::Amount(amount) if amount > 0 => {
            res.effects.push(Effect::Credit { player: player.id, amount });
        }
        CardEffect::Amount(amount) if amount < 0 => {
            res.charge(player, -amount, None, ChargeReason::Card);
        }
        CardEffect::Amount(_) => {}
        CardEffect::Move(delta) => {
            let (position, salary) = card_destination(player.position, delta);
            res.effects.push(Effect::MoveTo { player: player.id, position, salary });
            if delta == ADVANCE_TO_START {
                res.log = Some((card.text.to_string(), LogKind::Event));
            }
        }
        CardEffect::Action(CardAction::GoToJail) => {
            res.effects.push(Effect::SendToJail { player: player.id });
        }
        CardEffect::Action(CardAction::GetOutOfJail) => {}
        CardEffect::Action(CardAction::PayAll10) => {
            let others: Vec<_> = state
                .players
                .iter()
                .filter(|p| p.id != player.id && p.is_active())
                .map(|p| p.id)
                .collect();
            let total = GROUP_CARD_AMOUNT * others.len() as Money;
            if res.charge(player, total, None, ChargeReason::PayEveryone) {
                for id in others {
                    res.effects.push(Effect::Credit { player: id, amount: GROUP_CARD_AMOUNT });
                }
            }
        }
        CardEffect::Action(CardAction::CollectAll10) => {
            for other in state
                .players
                .iter()
                .filter(|p| p.id != player.id && p.is_active())
            {
                let amount = GROUP_CARD_AMOUNT.min(other.money.max(0));
                res.effects.push(Effect::Transfer { from: other.id, to: player.id, amount });
            }
        }
    }

    if res.decision.is_none() {
        if res.log.is_none() {
            res.log = Some((
                format!("{}: {}", square.name, card.text),
                LogKind::Event,
            ));
        }
        let (card_id, title, text) = (card.id, square.name.clone(), card.text.to_string());
        res.decision = Some(match kind {
            Deck::Chance => Decision::Chance { card_id, title, text },
            Deck::Community => Decision::Community { card_id, title, text },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::monopoly::board::find_card;
    use crate::games::monopoly::landing::resolve_landing;
    use crate::games::monopoly::state::tests::playing_state;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn land_with(state: &GameState, square: usize, kind: Deck, id: u32) -> Resolution {
        let card = find_card(kind, id).unwrap();
        resolve_landing(state, square, 7, Some(card))
    }

    #[test]
    fn destination_wraps_with_salary_forward_only() {
        assert_eq!(card_destination(36, ADVANCE_TO_START), (0, 200));
        assert_eq!(card_destination(7, ADVANCE_TO_START), (0, 200));
        assert_eq!(card_destination(39, 1), (0, 200));
        assert_eq!(card_destination(7, -3), (4, 0));
        assert_eq!(card_destination(2, -3), (39, 0));
        assert_eq!(card_destination(22, 1), (23, 0));
    }

    #[test]
    fn positive_amount_credits_and_opens_card_decision() {
        let mut s = playing_state(&[100, 100]);
        s.players[0].position = 7;
        let res = land_with(&s, 7, Deck::Chance, 8);
        assert_eq!(res.effects, vec![Effect::Credit { player: 1, amount: 200 }]);
        assert!(matches!(res.decision, Some(Decision::Chance { card_id: 8, .. })));
    }

    #[test]
    fn unaffordable_card_fine_replaces_card_decision() {
        let mut s = playing_state(&[100, 100]);
        s.players[0].position = 7;
        let res = land_with(&s, 7, Deck::Chance, 9);
        assert_eq!(res.decision, Some(Decision::Bankrupt { player_id: 1, owed: 150 }));
    }

    #[test]
    fn pay_all_charges_total_then_credits_solvent_opponents() {
        let mut s = playing_state(&[100, 100, 100, 100]);
        s.players[2].is_bankrupt = true;
        let res = land_with(&s, 22, Deck::Chance, 14);
        assert_eq!(
            res.effects,
            vec![
                Effect::Charge { payer: 1, amount: 20, beneficiary: None, reason: ChargeReason::PayEveryone },
                Effect::Credit { player: 2, amount: 10 },
                Effect::Credit { player: 4, amount: 10 },
            ]
        );
    }

    #[test]
    fn pay_all_without_funds_credits_nobody() {
        let s = playing_state(&[15, 100, 100]);
        let res = land_with(&s, 22, Deck::Chance, 14);
        assert_eq!(res.effects.len(), 1);
        assert!(res.is_bankrupting());
    }

    #[test]
    fn collect_all_takes_partial_from_poor_players() {
        let s = playing_state(&[100, 4, 50]);
        let res = land_with(&s, 17, Deck::Community, 13);
        assert_eq!(
            res.effects,
            vec![
                Effect::Transfer { from: 2, to: 1, amount: 4 },
                Effect::Transfer { from: 3, to: 1, amount: 10 },
            ]
        );
        assert!(matches!(res.decision, Some(Decision::Community { card_id: 13, .. })));
    }

    #[test]
    fn get_out_of_jail_is_inert() {
        let s = playing_state(&[100, 100]);
        let res = land_with(&s, 2, Deck::Community, 12);
        assert!(res.effects.is_empty());
        assert!(matches!(res.decision, Some(Decision::Community { .. })));
    }

    #[test]
    fn draws_are_deterministic_for_a_seed() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for _ in 0..32 {
            assert_eq!(
                draw(Deck::Chance, &mut a).map(|c| c.id),
                draw(Deck::Chance, &mut b).map(|c| c.id)
            );
        }
    }
}
