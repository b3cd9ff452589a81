use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Card rank, deuce through ace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub const fn symbol(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// Accepts the usual one-letter symbols, case-insensitive.
    pub fn from_symbol(c: char) -> Option<Self> {
        let c = c.to_ascii_uppercase();
        Rank::ALL.iter().copied().find(|r| r.symbol() == c)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub const fn symbol(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        Suit::ALL.iter().copied().find(|s| s.symbol() == c)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single playing card. Serialized in two-character notation (`"Ah"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("invalid card notation: {:?}", s));
        };
        let rank = Rank::from_symbol(r).ok_or_else(|| format!("invalid rank in {:?}", s))?;
        let suit = Suit::from_symbol(su).ok_or_else(|| format!("invalid suit in {:?}", s))?;
        Ok(Card::new(rank, suit))
    }
}

impl TryFrom<String> for Card {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

/// Parse a whitespace-separated list such as `"Ad 7c 2s"`.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, String> {
    s.split_whitespace().map(str::parse).collect()
}

/// Render a card list the same way `parse_cards` reads it.
pub fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let card: Card = "Ah".parse().unwrap();
        assert_eq!(card, Card::new(Rank::Ace, Suit::Hearts));
        assert_eq!(card.to_string(), "Ah");
        assert_eq!("td".parse::<Card>().unwrap().to_string(), "Td");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("A".parse::<Card>().is_err());
        assert!("Ahh".parse::<Card>().is_err());
        assert!("1h".parse::<Card>().is_err());
        assert!("Ax".parse::<Card>().is_err());
    }

    #[test]
    fn test_card_list_roundtrip() {
        let cards = parse_cards("Ad 7c 2s").unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(format_cards(&cards), "Ad 7c 2s");
    }

    #[test]
    fn test_serde_uses_short_notation() {
        let card = Card::new(Rank::King, Suit::Spades);
        assert_eq!(serde_json::to_string(&card).unwrap(), "\"Ks\"");
        let back: Card = serde_json::from_str("\"Ks\"").unwrap();
        assert_eq!(back, card);
    }
}
