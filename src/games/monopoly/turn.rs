//! Turn engine: roll, jail, movement, landing, decisions and turn end.

use rand::Rng;

use super::cards::draw;
use super::game::{Game, Scheduled};
use super::landing::resolve_landing;
use super::state::Payment;
use super::types::*;
use crate::engine::models::{EndReason, GameEvent, LogKind, PlayerId, Rejection, SquareId};

impl Game {
    pub(crate) fn cmd_roll(&mut self, loaded: Option<[u8; 2]>) -> Result<(), Rejection> {
        if let Some(dice) = loaded {
            if dice.iter().any(|d| !(1..=6).contains(d)) {
                return Err(Rejection::InvalidDice);
            }
        }
        self.require_playing()?;
        if !self.state.is_idle() {
            return Err(Rejection::Busy);
        }
        if self.state.dice_value.is_some() {
            return Err(Rejection::AlreadyRolled);
        }
        if self.state.pending_decision.is_some() {
            return Err(Rejection::DecisionOpen);
        }
        let player = self.state.current_player().ok_or(Rejection::NotPlaying)?.id;

        self.state.activity = Activity::Rolling;
        self.events.push(GameEvent::RollStarted { player });
        self.clock
            .schedule(self.timing.roll_ms(), Scheduled::RollSettled { loaded });
        Ok(())
    }

    pub(crate) fn settle_roll(&mut self, loaded: Option<[u8; 2]>) {
        if self.state.game_phase != GamePhase::Playing {
            return;
        }
        let dice = loaded.unwrap_or_else(|| [self.rng.gen_range(1..=6), self.rng.gen_range(1..=6)]);
        let idx = self.state.current_player_index;
        let Some(player) = self.state.players.get(idx) else {
            return;
        };
        let (id, name, in_jail) = (player.id, player.name.clone(), player.in_jail);
        let sum = u32::from(dice[0]) + u32::from(dice[1]);

        self.state.dice_value = Some(dice);
        self.events.push(GameEvent::DiceRolled { player: id, dice });
        self.log(
            format!("{name} rolled {} and {} ({sum}).", dice[0], dice[1]),
            LogKind::Info,
        );
        tracing::debug!(player = id, d1 = dice[0], d2 = dice[1], in_jail, "dice settled");

        if in_jail {
            self.roll_in_jail(idx, dice);
        } else {
            self.start_moving(id, sum);
        }
    }

    fn roll_in_jail(&mut self, idx: usize, dice: [u8; 2]) {
        let (id, name) = {
            let p = &self.state.players[idx];
            (p.id, p.name.clone())
        };

        if dice[0] == dice[1] {
            let p = &mut self.state.players[idx];
            p.in_jail = false;
            p.jail_turns = 0;
            self.events.push(GameEvent::ReleasedFromJail {
                player: id,
                bail_paid: false,
            });
            self.log(format!("{name} rolled doubles and left jail!"), LogKind::Success);
            self.start_moving(id, u32::from(dice[0]) * 2);
            return;
        }

        self.state.activity = Activity::Idle;
        let turns = {
            let p = &mut self.state.players[idx];
            p.jail_turns = p.jail_turns.saturating_add(1);
            p.jail_turns
        };
        if turns < MAX_JAIL_TURNS {
            self.events.push(GameEvent::StayedInJail {
                player: id,
                jail_turns: turns,
            });
            self.log(
                format!("{name} stays in jail ({turns}/{MAX_JAIL_TURNS})."),
                LogKind::Info,
            );
            return;
        }

        match self.state.charge(idx, JAIL_FINE, None) {
            Payment::Paid => {
                let p = &mut self.state.players[idx];
                p.in_jail = false;
                p.jail_turns = 0;
                self.events.push(GameEvent::ReleasedFromJail {
                    player: id,
                    bail_paid: true,
                });
                self.log(
                    format!("{name} paid a fine of {JAIL_FINE} and left jail."),
                    LogKind::Info,
                );
            }
            Payment::Bankrupt { forfeited } => {
                self.state.pending_decision = Some(Decision::Bankrupt {
                    player_id: id,
                    owed: JAIL_FINE,
                });
                self.log(
                    format!("{name} could not pay the jail fine and went bankrupt!"),
                    LogKind::Error,
                );
                self.on_bankrupt(id, None, forfeited);
            }
        }
    }

    fn start_moving(&mut self, player: PlayerId, steps: u32) {
        self.state.activity = Activity::Moving;
        self.clock.schedule(
            self.timing.step_ms,
            Scheduled::Step {
                player,
                remaining: steps,
                dice_sum: steps,
            },
        );
    }

    pub(crate) fn step(&mut self, player: PlayerId, remaining: u32, dice_sum: u32) {
        let Some(idx) = self.state.player_index(player) else {
            return;
        };
        let position = (self.state.players[idx].position + 1) % BOARD_SIZE;
        self.state.players[idx].position = position;
        self.events.push(GameEvent::Stepped { player, position });
        if position == 0 {
            self.pay_salary(idx, START_SALARY);
        }

        if remaining > 1 {
            self.clock.schedule(
                self.timing.step_ms,
                Scheduled::Step {
                    player,
                    remaining: remaining - 1,
                    dice_sum,
                },
            );
        } else {
            self.clock
                .schedule(self.timing.landing_delay_ms, Scheduled::Land { player, dice_sum });
        }
    }

    pub(crate) fn land(&mut self, player: PlayerId, dice_sum: u32) {
        self.state.activity = Activity::Idle;
        let Some(square_id) = self
            .state
            .current_player()
            .filter(|p| p.id == player)
            .map(|p| p.position)
        else {
            return;
        };
        self.events.push(GameEvent::Landed {
            player,
            square: square_id,
        });

        let deck = match self.state.squares.get(square_id).map(|s| s.kind) {
            Some(SquareKind::Chance) => Some(Deck::Chance),
            Some(SquareKind::Community) => Some(Deck::Community),
            _ => None,
        };
        let card = deck.and_then(|d| draw(d, &mut self.rng));
        if let (Some(deck), Some(card)) = (deck, card) {
            self.events.push(GameEvent::CardDrawn {
                player,
                deck,
                card_id: card.id,
            });
        }

        let res = resolve_landing(&self.state, square_id, dice_sum, card);
        self.apply_resolution(res);
    }

    pub(crate) fn cmd_end_turn(&mut self) -> Result<(), Rejection> {
        self.require_playing()?;
        if !self.state.is_idle() {
            return Err(Rejection::Busy);
        }
        if self.state.dice_value.is_none() {
            return Err(Rejection::NotRolled);
        }
        if self.state.pending_decision.is_some() {
            return Err(Rejection::DecisionOpen);
        }

        if self.state.players.len() > 1 && self.state.active_count() <= 1 {
            self.finish(EndReason::Bankruptcy);
            return Ok(());
        }

        self.state.current_player_index = self.state.next_player_index();
        self.state.dice_value = None;
        self.state.turn += 1;
        self.upgrade_tried = false;

        let Some(next) = self.state.current_player() else {
            return Ok(());
        };
        let (id, name) = (next.id, next.name.clone());
        self.events.push(GameEvent::TurnStarted { player: id });
        self.log(format!("{name}'s turn."), LogKind::Info);
        Ok(())
    }

    pub(crate) fn cmd_confirm_buy(&mut self) -> Result<(), Rejection> {
        self.require_playing()?;
        let (square_id, price) = match &self.state.pending_decision {
            Some(Decision::Buy {
                square_id, price, ..
            }) => (*square_id, *price),
            Some(_) => return Err(Rejection::WrongDecision),
            None => return Err(Rejection::NoDecision),
        };
        let idx = self.state.current_player_index;
        let Some(player) = self.state.players.get(idx) else {
            return Err(Rejection::NotPlaying);
        };
        let Some(square) = self.state.squares.get(square_id) else {
            return Err(Rejection::WrongDecision);
        };
        if square.owner.is_some() {
            return Err(Rejection::AlreadyOwned);
        }
        if player.money < price {
            return Err(Rejection::InsufficientFunds);
        }
        let (id, name, square_name) = (player.id, player.name.clone(), square.name.clone());

        self.state.players[idx].money -= price;
        self.state.squares[square_id].owner = Some(id);
        self.state.pending_decision = None;
        self.events.push(GameEvent::Purchased {
            player: id,
            square: square_id,
            price,
        });
        self.log(
            format!("{name} bought {square_name} for {price}."),
            LogKind::Success,
        );
        tracing::info!(player = id, square = square_id, amount = price, "purchase");
        Ok(())
    }

    pub(crate) fn cmd_upgrade_property(&mut self) -> Result<(), Rejection> {
        self.require_playing()?;
        let square_id = match &self.state.pending_decision {
            Some(Decision::Upgrade { square_id, .. }) => *square_id,
            Some(_) => return Err(Rejection::WrongDecision),
            None => return Err(Rejection::NoDecision),
        };
        self.upgrade_square(square_id)?;
        self.state.pending_decision = None;
        Ok(())
    }

    /// Add one house to a square the current player owns.
    pub(crate) fn upgrade_square(&mut self, square_id: SquareId) -> Result<(), Rejection> {
        self.require_playing()?;
        let idx = self.state.current_player_index;
        let Some(player) = self.state.players.get(idx) else {
            return Err(Rejection::NotPlaying);
        };
        let Some(square) = self.state.squares.get(square_id) else {
            return Err(Rejection::NotUpgradable);
        };
        if square.owner != Some(player.id) || !square.is_upgradable() {
            return Err(Rejection::NotUpgradable);
        }
        let cost = square.house_cost;
        if player.money < cost {
            return Err(Rejection::InsufficientFunds);
        }
        let (id, name, square_name) = (player.id, player.name.clone(), square.name.clone());

        self.state.players[idx].money -= cost;
        let houses = {
            let sq = &mut self.state.squares[square_id];
            sq.houses += 1;
            sq.houses
        };
        self.events.push(GameEvent::Upgraded {
            player: id,
            square: square_id,
            houses,
        });
        let level = if houses >= HOTEL {
            "a hotel".to_string()
        } else {
            format!("{houses} house(s)")
        };
        self.log(
            format!("{name} upgraded {square_name} to {level}."),
            LogKind::Success,
        );
        tracing::info!(player = id, square = square_id, amount = cost, houses, "upgrade");
        Ok(())
    }

    pub(crate) fn cmd_dismiss(&mut self) -> Result<(), Rejection> {
        self.require_playing()?;
        match &self.state.pending_decision {
            None => Err(Rejection::NoDecision),
            Some(Decision::Bankrupt { player_id, .. }) => {
                let player = *player_id;
                self.bankruptcy_check(player);
                Ok(())
            }
            Some(Decision::Buy { name, .. }) => {
                let square_name = name.clone();
                let player = self.state.current_player().map(|p| p.name.clone()).unwrap_or_default();
                self.state.pending_decision = None;
                self.log(format!("{player} passed on {square_name}."), LogKind::Info);
                Ok(())
            }
            Some(_) => {
                self.state.pending_decision = None;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::engine::config::Timing;
    use crate::engine::models::*;
    use crate::games::monopoly::board::{find_card, SQUARES};
    use crate::games::monopoly::game::Game;
    use crate::games::monopoly::landing::resolve_landing;
    use crate::games::monopoly::types::*;

    fn humans(n: usize) -> Vec<PlayerSetup> {
        (1..=n)
            .map(|i| PlayerSetup::human(&format!("P{i}"), "#fff"))
            .collect()
    }

    fn started(n: usize) -> Game {
        let mut g = Game::with_timing(1, Timing::default());
        assert!(g.start_game(humans(n), 1500, GameDuration::Unlimited).is_applied());
        g
    }

    #[test]
    fn roll_is_gated() {
        let mut g = Game::new(1);
        assert_eq!(g.roll_dice().rejection(), Some(&Rejection::NotPlaying));
        let mut g = started(2);
        assert!(g.roll_dice_with(1, 2).is_applied());
        assert_eq!(g.state().activity, Activity::Rolling);
        assert_eq!(g.roll_dice().rejection(), Some(&Rejection::Busy));
        assert_eq!(g.end_turn().rejection(), Some(&Rejection::Busy));
        g.settle();
        assert_eq!(g.roll_dice().rejection(), Some(&Rejection::AlreadyRolled));
        assert_eq!(g.roll_dice_with(0, 7).rejection(), Some(&Rejection::InvalidDice));
    }

    #[test]
    fn movement_is_animated_then_resolved() {
        let mut g = started(2);
        g.roll_dice_with(3, 4);
        // roll animation is 500ms
        g.advance(499);
        assert_eq!(g.state().dice_value, None);
        let events = g.advance(1);
        assert!(events.contains(&GameEvent::DiceRolled { player: 1, dice: [3, 4] }));
        assert_eq!(g.state().activity, Activity::Moving);
        g.advance(150 * 3);
        assert_eq!(g.state().players[0].position, 3);
        g.advance(150 * 4 - 1);
        assert_eq!(g.state().players[0].position, 6);
        g.advance(1);
        assert_eq!(g.state().players[0].position, 7);
        assert_eq!(g.state().activity, Activity::Moving);
        g.advance(300);
        assert_eq!(g.state().activity, Activity::Idle);
    }

    #[test]
    fn buying_debits_price_and_sets_owner() {
        let mut g = started(4);
        // Square 1 is unreachable with two dice from 0; place the token first.
        g.state.players[0].position = 38;
        g.roll_dice_with(1, 2);
        g.settle();
        assert_eq!(g.state().players[0].position, 1);
        assert_eq!(g.state().players[0].money, 1700);
        match &g.state().pending_decision {
            Some(Decision::Buy { price, square_id, .. }) => {
                assert_eq!(*price, 60);
                assert_eq!(*square_id, 1);
            }
            other => panic!("expected BUY, got {other:?}"),
        }
        assert!(g.confirm_buy().is_applied());
        assert_eq!(g.state().players[0].money, 1640);
        assert_eq!(g.state().squares[1].owner, Some(1));
        assert!(g.state().pending_decision.is_none());
    }

    #[test]
    fn buy_without_funds_is_declined_and_stays_open() {
        let mut g = started(2);
        g.state.players[0].money = 50;
        g.roll_dice_with(1, 2);
        g.settle();
        assert!(matches!(g.state().pending_decision, Some(Decision::Buy { .. })));
        assert_eq!(g.confirm_buy().rejection(), Some(&Rejection::InsufficientFunds));
        assert!(g.state().pending_decision.is_some());
        assert_eq!(g.end_turn().rejection(), Some(&Rejection::DecisionOpen));
        assert!(g.dismiss_decision().is_applied());
        assert!(g.end_turn().is_applied());
        assert_eq!(g.state().current_player_index, 1);
        assert_eq!(g.state().dice_value, None);
    }

    #[test]
    fn doubles_release_from_jail_and_move() {
        let mut g = started(2);
        g.state.players[0].position = JAIL_POSITION;
        g.state.players[0].in_jail = true;
        g.state.players[0].jail_turns = 1;
        g.roll_dice_with(4, 4);
        g.settle();
        let p = &g.state().players[0];
        assert!(!p.in_jail);
        assert_eq!(p.jail_turns, 0);
        assert_eq!(p.position, 18);
    }

    #[test]
    fn failed_jail_roll_stays_put() {
        let mut g = started(2);
        g.state.players[0].position = JAIL_POSITION;
        g.state.players[0].in_jail = true;
        g.roll_dice_with(1, 2);
        let events = g.settle();
        assert!(events.contains(&GameEvent::StayedInJail { player: 1, jail_turns: 1 }));
        assert_eq!(g.state().players[0].position, JAIL_POSITION);
        assert!(g.state().players[0].in_jail);
        assert!(g.state().is_idle());
        assert!(g.end_turn().is_applied());
    }

    #[test]
    fn third_failed_roll_pays_fine_without_moving() {
        let mut g = started(2);
        g.state.players[0].position = JAIL_POSITION;
        g.state.players[0].in_jail = true;
        g.state.players[0].jail_turns = 2;
        g.roll_dice_with(1, 2);
        g.settle();
        let p = &g.state().players[0];
        assert!(!p.in_jail);
        assert_eq!(p.jail_turns, 0);
        assert_eq!(p.money, 1450);
        assert_eq!(p.position, JAIL_POSITION);
    }

    #[test]
    fn unaffordable_jail_fine_bankrupts_with_no_beneficiary() {
        let mut g = started(3);
        g.state.players[0].position = JAIL_POSITION;
        g.state.players[0].in_jail = true;
        g.state.players[0].jail_turns = 2;
        g.state.players[0].money = 30;
        g.roll_dice_with(5, 6);
        g.advance(500);
        let p = &g.state().players[0];
        assert!(p.is_bankrupt);
        assert_eq!(p.money, 0);
        assert_eq!(
            g.state().pending_decision,
            Some(Decision::Bankrupt { player_id: 1, owed: 50 })
        );
        assert_eq!(g.state().players[1].money, 1500);
        assert_eq!(g.state().players[2].money, 1500);
        // display delay, then play continues with the decision cleared
        g.advance(2000);
        assert!(g.state().pending_decision.is_none());
        assert_eq!(g.state().game_phase, GamePhase::Playing);
        assert!(g.end_turn().is_applied());
        assert_eq!(g.state().current_player_index, 1);
    }

    #[test]
    fn upgrade_decision_adds_a_house() {
        let mut g = started(2);
        g.state.squares[3].owner = Some(1);
        g.roll_dice_with(1, 2);
        g.settle();
        assert!(matches!(g.state().pending_decision, Some(Decision::Upgrade { cost: 50, .. })));
        assert_eq!(g.confirm_buy().rejection(), Some(&Rejection::WrongDecision));
        assert!(g.upgrade_property().is_applied());
        assert_eq!(g.state().squares[3].houses, 1);
        assert_eq!(g.state().players[0].money, 1450);
    }

    #[test]
    fn rent_is_paid_to_owner() {
        let mut g = started(2);
        g.state.squares[6].owner = Some(2);
        g.state.squares[6].houses = 2;
        g.roll_dice_with(3, 3);
        let events = g.settle();
        assert!(events.contains(&GameEvent::RentPaid { payer: 1, owner: 2, square: 6, amount: 90 }));
        assert_eq!(g.state().players[0].money, 1410);
        assert_eq!(g.state().players[1].money, 1590);
    }

    #[test]
    fn landing_on_go_to_jail_moves_to_jail() {
        let mut g = started(2);
        g.state.players[0].position = 25;
        g.roll_dice_with(2, 3);
        g.settle();
        let p = &g.state().players[0];
        assert_eq!(p.position, JAIL_POSITION);
        assert!(p.in_jail);
        assert!(matches!(g.state().pending_decision, Some(Decision::Info { .. })));
    }

    /// Land the current player on `square` holding a known card and apply it.
    fn draw_on(g: &mut Game, square: SquareId, kind: Deck, id: u32) -> Vec<GameEvent> {
        g.state.players[0].position = square;
        let res = resolve_landing(&g.state, square, 7, find_card(kind, id));
        g.apply_resolution(res);
        g.take_events()
    }

    #[test]
    fn advance_to_start_card_pays_salary_from_every_chance_square() {
        for square in [7, 22, 36] {
            let mut g = started(4);
            let events = draw_on(&mut g, square, Deck::Chance, 16);
            let p = &g.state().players[0];
            assert_eq!(p.position, 0, "from {square}");
            assert_eq!(p.money, 1700, "from {square}");
            assert!(events.contains(&GameEvent::PassedStart { player: 1, salary: START_SALARY }));
            assert!(matches!(
                g.state().pending_decision,
                Some(Decision::Chance { card_id: 16, .. })
            ));
        }
    }

    #[test]
    fn go_to_jail_card_jails_the_player() {
        let mut g = started(2);
        let events = draw_on(&mut g, 22, Deck::Chance, 12);
        let p = &g.state().players[0];
        assert_eq!(p.position, JAIL_POSITION);
        assert!(p.in_jail);
        assert_eq!(p.money, 1500);
        assert!(events.contains(&GameEvent::SentToJail { player: 1 }));
        assert!(matches!(
            g.state().pending_decision,
            Some(Decision::Chance { card_id: 12, .. })
        ));
    }

    #[test]
    fn backward_card_move_wraps_without_salary() {
        let mut g = started(2);
        let events = draw_on(&mut g, 2, Deck::Chance, 6);
        assert_eq!(g.state().players[0].position, 39);
        assert_eq!(g.state().players[0].money, 1500);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::PassedStart { .. })));
    }

    proptest! {
        #[test]
        fn passing_start_by_dice_pays_salary_once(
            position in 28usize..BOARD_SIZE,
            d1 in 1u8..=6,
            d2 in 1u8..=6,
        ) {
            let steps = (d1 + d2) as usize;
            prop_assume!(position + steps >= BOARD_SIZE);
            let dest = (position + steps) % BOARD_SIZE;
            let kind = kind_of(dest);
            // a drawn card may move the token again
            prop_assume!(!matches!(kind, SquareKind::Chance | SquareKind::Community));

            let mut g = started(2);
            g.state.players[0].position = position;
            prop_assert!(g.roll_dice_with(d1, d2).is_applied());
            let events = g.settle();

            let salaries: Vec<_> = events
                .iter()
                .filter(|e| matches!(e, GameEvent::PassedStart { .. }))
                .collect();
            prop_assert_eq!(salaries, vec![&GameEvent::PassedStart { player: 1, salary: START_SALARY }]);
            let p = &g.state().players[0];
            prop_assert_eq!(p.position, dest);
            let tax = if kind == SquareKind::Tax { g.state().squares[dest].price } else { 0 };
            prop_assert_eq!(p.money, 1500 + START_SALARY - tax);
        }
    }

    fn kind_of(square: SquareId) -> SquareKind {
        SQUARES[square].kind
    }
}
