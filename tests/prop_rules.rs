//! Property tests for the money, movement and turn-order rules.

use proptest::prelude::*;

use monopoly_game_engine::engine::models::*;
use monopoly_game_engine::games::monopoly::cards::card_destination;
use monopoly_game_engine::games::monopoly::state::Payment;
use monopoly_game_engine::games::monopoly::types::*;
use monopoly_game_engine::games::monopoly::{rankings, Game, GameState};

fn seat(id: PlayerId, money: Money, is_bankrupt: bool) -> Player {
    Player {
        id,
        name: format!("P{id}"),
        color: "#ffffff".into(),
        controller: Controller::Human,
        money,
        position: 0,
        is_bankrupt,
        in_jail: false,
        jail_turns: 0,
    }
}

fn state_with(players: Vec<Player>) -> GameState {
    let mut state = GameState::new();
    state.players = players;
    state.game_phase = GamePhase::Playing;
    state
}

proptest! {
    #[test]
    fn card_moves_stay_on_board(position in 0usize..BOARD_SIZE, delta in -3i32..=3) {
        let (dest, salary) = card_destination(position, delta);
        prop_assert!(dest < BOARD_SIZE);
        let raw = position as i32 + delta;
        prop_assert_eq!(dest as i32, raw.rem_euclid(BOARD_SIZE as i32));
        prop_assert_eq!(salary, if raw >= BOARD_SIZE as i32 { START_SALARY } else { 0 });
    }

    #[test]
    fn advance_to_start_always_pays(position in 0usize..BOARD_SIZE) {
        prop_assert_eq!(card_destination(position, ADVANCE_TO_START), (0, START_SALARY));
    }

    #[test]
    fn strict_payment_never_goes_negative(
        balance in 0i64..3_000,
        amount in 1i64..3_000,
        creditor in 0i64..3_000,
    ) {
        let mut state = state_with(vec![seat(1, balance, false), seat(2, creditor, false)]);
        let outcome = state.charge(0, amount, Some(2));
        let (payer, owner) = (&state.players[0], &state.players[1]);

        prop_assert!(payer.money >= 0);
        prop_assert_eq!(payer.money + owner.money, balance + creditor);
        if balance < amount {
            prop_assert_eq!(outcome, Payment::Bankrupt { forfeited: balance });
            prop_assert!(payer.is_bankrupt);
            prop_assert_eq!(payer.money, 0);
        } else {
            prop_assert_eq!(outcome, Payment::Paid);
            prop_assert!(!payer.is_bankrupt);
            prop_assert_eq!(payer.money, balance - amount);
        }
    }

    #[test]
    fn unowned_charge_destroys_money(balance in 0i64..3_000, amount in 1i64..3_000) {
        let mut state = state_with(vec![seat(1, balance, false), seat(2, 500, false)]);
        state.charge(0, amount, None);
        prop_assert_eq!(state.players[0].money, (balance - amount).max(0));
        prop_assert_eq!(state.players[1].money, 500);
    }

    #[test]
    fn next_seat_is_first_solvent_after_current(
        bankrupt in proptest::collection::vec(any::<bool>(), 2..=6),
        current in 0usize..6,
    ) {
        let n = bankrupt.len();
        let current = current % n;
        let players = bankrupt
            .iter()
            .enumerate()
            .map(|(i, &b)| seat(i as PlayerId + 1, 100, b))
            .collect();
        let mut state = state_with(players);
        state.current_player_index = current;

        let next = state.next_player_index();
        prop_assert!(next < n);
        let expected = (1..=n).map(|k| (current + k) % n).find(|&i| !bankrupt[i]);
        if let Some(expected) = expected {
            prop_assert_eq!(next, expected);
        }
    }

    #[test]
    fn monopoly_needs_every_square_of_the_group(mask in any::<u8>()) {
        let mut state = state_with(vec![seat(1, 1500, false), seat(2, 1500, false)]);
        // Light blue: 6, 8, 9
        let group = [6usize, 8, 9];
        for (bit, &sq) in group.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                state.squares[sq].owner = Some(1);
            }
        }
        let owned = group.iter().filter(|&&sq| state.squares[sq].owner == Some(1)).count();
        prop_assert_eq!(
            state.check_monopoly(Some(ColorGroup::LightBlue), 1, None),
            owned == group.len()
        );
        // Counting one unowned square as bought completes the group only
        // when it is the single one missing.
        let missing: Vec<_> = group.iter().copied().filter(|&sq| state.squares[sq].owner != Some(1)).collect();
        if missing.len() == 1 {
            prop_assert!(state.check_monopoly(Some(ColorGroup::LightBlue), 1, Some(missing[0])));
        }
        prop_assert!(!state.check_monopoly(None, 1, None));
    }

    #[test]
    fn vote_needs_strict_human_majority(humans in 1usize..=5, voters in 0usize..=5) {
        let voters = voters.min(humans);
        let mut players: Vec<PlayerSetup> = (1..=humans)
            .map(|i| PlayerSetup::human(&format!("H{i}"), "#ffffff"))
            .collect();
        players.push(PlayerSetup::ai("Bot", "#000000"));

        let mut game = Game::new(0);
        prop_assert!(game.start_game(players, 1500, GameDuration::Unlimited).is_applied());
        for id in 1..=voters {
            game.vote_to_end(id as PlayerId);
        }
        let over = game.state().game_phase == GamePhase::GameOver;
        prop_assert_eq!(over, voters * 2 > humans);
        if over {
            prop_assert_eq!(game.state().end_reason, Some(EndReason::VoteToEnd));
        }
    }

    #[test]
    fn rankings_are_ordered_by_wealth(
        money in proptest::collection::vec(0i64..5_000, 2..=6),
        owned in proptest::collection::vec(0usize..BOARD_SIZE, 0..10),
    ) {
        let players = money
            .iter()
            .enumerate()
            .map(|(i, &m)| seat(i as PlayerId + 1, m, false))
            .collect();
        let mut state = state_with(players);
        for (k, sq) in owned.into_iter().enumerate() {
            if state.squares[sq].is_purchasable() {
                state.squares[sq].owner = Some((k % money.len()) as PlayerId + 1);
            }
        }

        let standings = rankings(&state);
        prop_assert_eq!(standings.len(), money.len());
        for (i, s) in standings.iter().enumerate() {
            prop_assert_eq!(s.rank, i + 1);
            prop_assert_eq!(s.total_wealth, s.money + s.property_value);
        }
        for pair in standings.windows(2) {
            prop_assert!(pair[0].total_wealth >= pair[1].total_wealth);
            if pair[0].total_wealth == pair[1].total_wealth {
                prop_assert!(pair[0].player_id < pair[1].player_id);
            }
        }
    }
}
