use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::errors::{GameError, GameResult};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    /// Suits in canonical deck order.
    pub const ALL: [Suit; 4] = [Self::Club, Self::Diamond, Self::Heart, Self::Spade];

    fn as_char(self) -> char {
        match self {
            Self::Club => 'c',
            Self::Diamond => 'd',
            Self::Heart => 'h',
            Self::Spade => 's',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Placeholder for card values, deuce=2u8 ... ace=14u8.
pub type Value = u8;

/// A card is a tuple of a uInt8 value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            14 => 'A',
            v => char::from(b'0' + v),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// Parses the two-character form produced by `Display`, e.g. `Ah` or `7c`.
impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidCard(s.to_string());
        let mut chars = s.chars();
        let (Some(value), Some(suit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        let value = match value {
            '2'..='9' => value as u8 - b'0',
            'T' => 10,
            'J' => 11,
            'Q' => 12,
            'K' => 13,
            'A' => 14,
            _ => return Err(invalid()),
        };
        let suit = match suit {
            'c' => Suit::Club,
            'd' => Suit::Diamond,
            'h' => Suit::Heart,
            's' => Suit::Spade,
            _ => return Err(invalid()),
        };
        Ok(Card(value, suit))
    }
}

/// Remaining undealt cards. The top of the deck is the front of the vec.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    /// The full 52 cards in canonical order: clubs, diamonds, hearts and
    /// spades, each running deuce to ace.
    fn default() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| (2..=14).map(move |value| Card(value, suit)))
            .collect();
        Self { cards }
    }
}

impl Deck {
    /// Rebuilds a deck from previously dealt-from state.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Uniform Fisher-Yates permutation of the remaining cards.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes and returns the top `n` cards. The deck is left untouched if
    /// it can't cover the request.
    pub fn deal_top(&mut self, n: usize) -> GameResult<Vec<Card>> {
        if n > self.cards.len() {
            return Err(GameError::InsufficientCards {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }
}

/// Whole chips. All bets, stacks and pots are counted in chips.
pub type Chips = u32;

pub type TableId = Uuid;

pub type UserId = i64;

/// 1-based seat number at a table.
pub type SeatNumber = u8;

/// 1-based order among the players dealt into the current hand.
pub type Position = u8;

/// Betting-round stage of a hand. Tables only ever move forward through
/// these.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Starting,
    Preflop,
    Flop,
    Turn,
    River,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Preflop => "PREFLOP",
            Self::Flop => "FLOP",
            Self::Turn => "TURN",
            Self::River => "RIVER",
        }
    }

    /// Phases in which players take betting actions.
    pub const fn is_betting(self) -> bool {
        !matches!(self, Self::Starting)
    }

    /// The phase entered once this phase's betting round completes, along
    /// with the number of board cards dealt on entry.
    pub const fn next_street(self) -> Option<(Phase, usize)> {
        match self {
            Self::Preflop => Some((Self::Flop, 3)),
            Self::Flop => Some((Self::Turn, 1)),
            Self::Turn => Some((Self::River, 1)),
            Self::Starting | Self::River => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(Self::Starting),
            "PREFLOP" => Ok(Self::Preflop),
            "FLOP" => Ok(Self::Flop),
            "TURN" => Ok(Self::Turn),
            "RIVER" => Ok(Self::River),
            other => Err(GameError::UnknownPhase(other.to_string())),
        }
    }
}

/// What a player asked to do, before any amount is attached.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CheckOrCall,
    CheckOrFold,
    Bet,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::CheckOrCall => "check_or_call",
            Self::CheckOrFold => "check_or_fold",
            Self::Bet => "bet",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for ActionKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check_or_call" => Ok(Self::CheckOrCall),
            "check_or_fold" => Ok(Self::CheckOrFold),
            "bet" => Ok(Self::Bet),
            other => Err(GameError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    CheckOrCall,
    CheckOrFold,
    Bet(Chips),
}

impl Action {
    /// Pairs a requested action kind with its amount. Only bets carry one.
    pub fn new(kind: ActionKind, amount: Option<Chips>) -> GameResult<Self> {
        match (kind, amount) {
            (ActionKind::CheckOrCall, _) => Ok(Self::CheckOrCall),
            (ActionKind::CheckOrFold, _) => Ok(Self::CheckOrFold),
            (ActionKind::Bet, Some(amount)) => Ok(Self::Bet(amount)),
            (ActionKind::Bet, None) => Err(GameError::MissingBetAmount),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CheckOrCall => write!(f, "checks or calls"),
            Self::CheckOrFold => write!(f, "checks or folds"),
            Self::Bet(amount) => write!(f, "bets {amount}"),
        }
    }
}

/// Renders cards as a space separated list, e.g. `Ah Kd 7c`.
pub fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inverse of [`format_cards`]. An empty string is an empty list.
pub fn parse_cards(s: &str) -> GameResult<Vec<Card>> {
    s.split_whitespace().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    // === Card Tests ===

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Heart).to_string(), "Ah");
        assert_eq!(Card(10, Suit::Diamond).to_string(), "Td");
        assert_eq!(Card(7, Suit::Club).to_string(), "7c");
        assert_eq!(Card(2, Suit::Spade).to_string(), "2s");
    }

    #[test]
    fn test_card_parse() {
        assert_eq!("Ah".parse::<Card>().unwrap(), Card(14, Suit::Heart));
        assert_eq!("9s".parse::<Card>().unwrap(), Card(9, Suit::Spade));
    }

    #[test]
    fn test_card_parse_rejects_garbage() {
        for bad in ["", "A", "Ahh", "1c", "Ax", "ah"] {
            assert!(
                matches!(bad.parse::<Card>(), Err(GameError::InvalidCard(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_cards_empty() {
        assert!(parse_cards("").unwrap().is_empty());
    }

    #[test]
    fn test_format_then_parse_whole_deck() {
        let deck = Deck::default();
        let repr = format_cards(deck.cards());
        assert_eq!(parse_cards(&repr).unwrap(), deck.cards());
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_initialization() {
        let deck = Deck::default();
        assert_eq!(deck.len(), 52);
        let unique: HashSet<_> = deck.cards().iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn test_deck_canonical_order() {
        let deck = Deck::default();
        assert_eq!(deck.cards()[0], Card(2, Suit::Club));
        assert_eq!(deck.cards()[12], Card(14, Suit::Club));
        assert_eq!(deck.cards()[13], Card(2, Suit::Diamond));
        assert_eq!(deck.cards()[51], Card(14, Suit::Spade));
    }

    #[test]
    fn test_deck_shuffle_keeps_cards() {
        let mut deck = Deck::default();
        deck.shuffle(&mut StdRng::seed_from_u64(7));
        assert_eq!(deck.len(), 52);
        assert_ne!(deck, Deck::default());

        let mut sorted = deck.cards().to_vec();
        sorted.sort();
        let mut canonical = Deck::default().cards().to_vec();
        canonical.sort();
        assert_eq!(sorted, canonical);
    }

    #[test]
    fn test_deck_deal_top() {
        let mut deck = Deck::default();
        let dealt = deck.deal_top(3).unwrap();
        assert_eq!(
            dealt,
            vec![Card(2, Suit::Club), Card(3, Suit::Club), Card(4, Suit::Club)]
        );
        assert_eq!(deck.len(), 49);
        assert_eq!(deck.cards()[0], Card(5, Suit::Club));
    }

    #[test]
    fn test_deck_deal_top_insufficient() {
        let mut deck = Deck::from_cards(vec![Card(2, Suit::Club)]);
        assert_eq!(
            deck.deal_top(2),
            Err(GameError::InsufficientCards {
                requested: 2,
                remaining: 1
            })
        );
        assert_eq!(deck.len(), 1);
    }

    // === Phase Tests ===

    #[test]
    fn test_phase_string_mapping_is_total() {
        for phase in [
            Phase::Starting,
            Phase::Preflop,
            Phase::Flop,
            Phase::Turn,
            Phase::River,
        ] {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn test_phase_unknown_string() {
        assert_eq!(
            "SHOWDOWN".parse::<Phase>(),
            Err(GameError::UnknownPhase("SHOWDOWN".to_string()))
        );
        assert!("preflop".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_next_street() {
        assert_eq!(Phase::Preflop.next_street(), Some((Phase::Flop, 3)));
        assert_eq!(Phase::Flop.next_street(), Some((Phase::Turn, 1)));
        assert_eq!(Phase::Turn.next_street(), Some((Phase::River, 1)));
        assert_eq!(Phase::River.next_street(), None);
        assert_eq!(Phase::Starting.next_street(), None);
    }

    // === Action Tests ===

    #[test]
    fn test_action_bet_requires_amount() {
        assert_eq!(
            Action::new(ActionKind::Bet, None),
            Err(GameError::MissingBetAmount)
        );
        assert_eq!(Action::new(ActionKind::Bet, Some(100)), Ok(Action::Bet(100)));
    }

    #[test]
    fn test_action_ignores_amount_for_checks() {
        assert_eq!(
            Action::new(ActionKind::CheckOrCall, Some(5)),
            Ok(Action::CheckOrCall)
        );
        assert_eq!(
            Action::new(ActionKind::CheckOrFold, None),
            Ok(Action::CheckOrFold)
        );
    }

    #[test]
    fn test_action_kind_strings() {
        for kind in [ActionKind::CheckOrCall, ActionKind::CheckOrFold, ActionKind::Bet] {
            assert_eq!(kind.to_string().parse::<ActionKind>().unwrap(), kind);
        }
        assert!("raise".parse::<ActionKind>().is_err());
    }
}
