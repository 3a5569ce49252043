//! Static board layout and card decks.

use once_cell::sync::Lazy;

use super::types::*;
use crate::engine::models::{Money, SquareId};
use CardAction as A;
use CardEffect::{Action, Amount, Move};
use ColorGroup::*;

fn property(
    id: SquareId,
    name: &str,
    price: Money,
    rent: [Money; 6],
    house_cost: Money,
    group: ColorGroup,
) -> Square {
    Square {
        id,
        name: name.into(),
        kind: SquareKind::Property,
        price,
        rent,
        house_cost,
        color_group: Some(group),
        owner: None,
        houses: 0,
        is_mortgaged: false,
    }
}

fn special(id: SquareId, name: &str, kind: SquareKind, price: Money) -> Square {
    Square {
        id,
        name: name.into(),
        kind,
        price,
        rent: [0; 6],
        house_cost: 0,
        color_group: None,
        owner: None,
        houses: 0,
        is_mortgaged: false,
    }
}

/// The 40 squares in board order; `SQUARES[i].id == i`.
pub static SQUARES: Lazy<Vec<Square>> = Lazy::new(|| {
    use SquareKind::*;
    vec![
        // bottom row
        special(0, "Start", Start, 0),
        property(1, "Puran Dhaka", 60, [2, 10, 30, 90, 160, 250], 50, Brown),
        special(2, "Community Chest", Community, 0),
        property(3, "Jatrabari", 60, [4, 20, 60, 180, 320, 450], 50, Brown),
        special(4, "Income Tax", Tax, 200),
        special(5, "Kamalapur Station", Utility, 200),
        property(6, "New Market", 100, [6, 30, 90, 270, 400, 550], 50, LightBlue),
        special(7, "Chance", Chance, 0),
        property(8, "Shahbag", 100, [6, 30, 90, 270, 400, 550], 50, LightBlue),
        property(9, "Farmgate", 120, [8, 40, 100, 300, 450, 600], 50, LightBlue),
        special(10, "Jail", Jail, 0),
        // left column
        property(11, "Mirpur", 140, [10, 50, 150, 450, 625, 750], 100, Pink),
        special(12, "Electric Supply", Utility, 150),
        property(13, "Mohammadpur", 140, [10, 50, 150, 450, 625, 750], 100, Pink),
        property(14, "Uttara", 160, [12, 60, 180, 500, 700, 900], 100, Pink),
        special(15, "Mymensingh Station", Utility, 200),
        property(16, "Gazipur", 180, [14, 70, 200, 550, 750, 950], 100, Orange),
        special(17, "Community Chest", Community, 0),
        property(18, "Savar", 180, [14, 70, 200, 550, 750, 950], 100, Orange),
        property(19, "Bara Bazar", 200, [16, 80, 220, 600, 800, 1000], 100, Orange),
        special(20, "Rest House", Rest, 0),
        // top row
        property(21, "Batali Hill", 220, [18, 90, 250, 700, 875, 1050], 150, Red),
        special(22, "Chance", Chance, 0),
        property(23, "Pathorghata", 220, [18, 90, 250, 700, 875, 1050], 150, Red),
        property(24, "Mehedibagh", 240, [20, 100, 300, 750, 925, 1100], 150, Red),
        special(25, "Sylhet Station", Utility, 200),
        property(26, "Laldighi Maidan", 260, [22, 110, 330, 800, 975, 1150], 150, Yellow),
        property(27, "Agrabad", 260, [22, 110, 330, 800, 975, 1150], 150, Yellow),
        special(28, "Water Works", Utility, 150),
        property(29, "Kushali", 280, [24, 120, 360, 850, 1025, 1200], 150, Yellow),
        special(30, "Go To Jail", GoToJail, 0),
        // right column
        property(31, "Wari", 300, [26, 130, 390, 900, 1100, 1275], 200, Green),
        property(32, "Motijheel", 300, [26, 130, 390, 900, 1100, 1275], 200, Green),
        special(33, "Community Chest", Community, 0),
        property(34, "Dhanmondi", 320, [28, 150, 450, 1000, 1200, 1400], 200, Green),
        special(35, "Chattogram Station", Utility, 200),
        special(36, "Chance", Chance, 0),
        property(37, "Banani", 350, [35, 175, 500, 1100, 1300, 1500], 200, DarkBlue),
        special(38, "Luxury Tax", Tax, 100),
        property(39, "Gulshan", 400, [50, 200, 600, 1400, 1700, 2000], 200, DarkBlue),
    ]
});

const fn card(id: u32, text: &'static str, effect: CardEffect) -> Card {
    Card { id, text, effect }
}

pub static CHANCE_CARDS: [Card; 16] = [
    card(1, "Bank pays you a dividend of 50.", Amount(50)),
    card(2, "Speeding fine of 15.", Amount(-15)),
    card(3, "You won a crossword competition. Collect 100.", Amount(100)),
    card(4, "Pay the doctor's fee of 50.", Amount(-50)),
    card(5, "It is your birthday. Collect a gift of 20.", Amount(20)),
    card(6, "Go back 3 squares.", Move(-3)),
    card(7, "Repairs cost you 40.", Amount(-40)),
    card(8, "You won the lottery! Collect 200.", Amount(200)),
    card(9, "Pay school fees of 150.", Amount(-150)),
    card(10, "Drunkenness fine of 20.", Amount(-20)),
    card(11, "Take a trip forward one square (collect 200 if you pass Start).", Move(1)),
    card(12, "Go directly to jail.", Action(A::GoToJail)),
    card(13, "Get out of jail free.", Action(A::GetOutOfJail)),
    card(14, "Pay every player 10.", Action(A::PayAll10)),
    card(15, "Stock market profit of 150.", Amount(150)),
    card(16, "Advance to Start (collect 200).", Move(ADVANCE_TO_START)),
];

pub static COMMUNITY_CARDS: [Card; 16] = [
    card(1, "Doctor's visit. Pay 50.", Amount(-50)),
    card(2, "Bank error in your favour. Collect 200.", Amount(200)),
    card(3, "Income tax refund. Collect 20.", Amount(20)),
    card(4, "Life insurance matures. Collect 100.", Amount(100)),
    card(5, "Pay hospital bill of 100.", Amount(-100)),
    card(6, "You receive a scholarship of 100.", Amount(100)),
    card(7, "Receive a consultancy fee of 25.", Amount(25)),
    card(8, "Pay 40 for road repairs.", Amount(-40)),
    card(9, "Beauty parlour bill of 10.", Amount(-10)),
    card(10, "An old debt is repaid. Collect 50.", Amount(50)),
    card(11, "Go directly to jail.", Action(A::GoToJail)),
    card(12, "Get out of jail free.", Action(A::GetOutOfJail)),
    card(13, "It is your birthday. Collect 10 from every player.", Action(A::CollectAll10)),
    card(14, "Profit from a property sale. Collect 100.", Amount(100)),
    card(15, "Holiday expenses of 100.", Amount(-100)),
    card(16, "Go back to Start.", Move(ADVANCE_TO_START)),
];

pub fn deck(kind: Deck) -> &'static [Card] {
    match kind {
        Deck::Chance => &CHANCE_CARDS,
        Deck::Community => &COMMUNITY_CARDS,
    }
}

pub fn find_card(kind: Deck, id: u32) -> Option<&'static Card> {
    deck(kind).iter().find(|c| c.id == id)
}

/// Fresh mutable copy of the board for a new game.
pub fn initial_squares() -> Vec<Square> {
    SQUARES.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_forty_squares_in_order() {
        assert_eq!(SQUARES.len(), BOARD_SIZE);
        for (i, sq) in SQUARES.iter().enumerate() {
            assert_eq!(sq.id, i);
            assert!(sq.owner.is_none());
            assert_eq!(sq.houses, 0);
        }
        assert_eq!(SQUARES[JAIL_POSITION].kind, SquareKind::Jail);
        assert_eq!(SQUARES[30].kind, SquareKind::GoToJail);
    }

    #[test]
    fn groups_have_expected_sizes() {
        let count = |g| SQUARES.iter().filter(|s| s.color_group == Some(g)).count();
        assert_eq!(count(ColorGroup::Brown), 2);
        assert_eq!(count(ColorGroup::LightBlue), 3);
        assert_eq!(count(ColorGroup::DarkBlue), 2);
        let grouped: usize = SQUARES.iter().filter(|s| s.color_group.is_some()).count();
        assert_eq!(grouped, 22);
    }

    #[test]
    fn decks_have_sixteen_unique_ids() {
        for kind in [Deck::Chance, Deck::Community] {
            let cards = deck(kind);
            assert_eq!(cards.len(), 16);
            let mut ids: Vec<u32> = cards.iter().map(|c| c.id).collect();
            ids.dedup();
            assert_eq!(ids.len(), 16);
        }
        assert_eq!(find_card(Deck::Chance, 16).map(|c| c.effect), Some(Move(ADVANCE_TO_START)));
    }
}
