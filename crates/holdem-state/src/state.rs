use crate::card::{format_cards, Card};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Stage of the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Unknown,
    Preflop,
    Flop,
    Turn,
    River,
}

impl Phase {
    /// Phase implied by a community-card count, if the count is legal.
    pub fn from_board_len(len: usize) -> Option<Self> {
        match len {
            0 => Some(Phase::Preflop),
            3 => Some(Phase::Flop),
            4 => Some(Phase::Turn),
            5 => Some(Phase::River),
            _ => None,
        }
    }

    /// Number of community cards this phase requires. `None` for `Unknown`.
    pub fn board_len(self) -> Option<usize> {
        match self {
            Phase::Unknown => None,
            Phase::Preflop => Some(0),
            Phase::Flop => Some(3),
            Phase::Turn => Some(4),
            Phase::River => Some(5),
        }
    }

    /// `Unknown` and `Preflop` are where every hand starts; a later street
    /// observed on screen may replace them.
    pub fn is_initial(self) -> bool {
        matches!(self, Phase::Unknown | Phase::Preflop)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unknown => "unknown",
            Phase::Preflop => "preflop",
            Phase::Flop => "flop",
            Phase::Turn => "turn",
            Phase::River => "river",
        };
        f.write_str(name)
    }
}

/// Forced bets, in table currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blinds {
    pub small: f64,
    pub big: f64,
}

/// Canonical, structurally valid game state for one table.
///
/// Only the fuser builds these from observations; downstream consumers treat
/// them as immutable values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub hero_cards: Vec<Card>,
    pub board_cards: Vec<Card>,
    pub phase: Phase,
    pub blinds: Option<Blinds>,
    pub pot: Option<f64>,
    pub hero_stack: Option<f64>,
    pub hand_id: Option<String>,
}

/// Violation of the shared structural invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("card {0} appears more than once across hero and board")]
    DuplicateCard(Card),
    #[error("hero must hold exactly 2 cards, found {0}")]
    HeroCount(usize),
    #[error("board has {board} card(s), which does not match phase {phase}")]
    BoardPhaseMismatch { board: usize, phase: Phase },
    #[error("small blind {small} exceeds big blind {big}")]
    BlindOrder { small: f64, big: f64 },
    #[error("negative amount for {field}: {value}")]
    NegativeAmount { field: &'static str, value: f64 },
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every structural invariant, reporting the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.hero_cards.is_empty() && self.hero_cards.len() != 2 {
            return Err(ValidationError::HeroCount(self.hero_cards.len()));
        }

        let mut seen = HashSet::new();
        for card in self.hero_cards.iter().chain(self.board_cards.iter()) {
            if !seen.insert(*card) {
                return Err(ValidationError::DuplicateCard(*card));
            }
        }

        let board = self.board_cards.len();
        let board_ok = match self.phase.board_len() {
            Some(expected) => expected == board,
            None => Phase::from_board_len(board).is_some(),
        };
        if !board_ok {
            return Err(ValidationError::BoardPhaseMismatch {
                board,
                phase: self.phase,
            });
        }

        if let Some(b) = self.blinds {
            if b.small < 0.0 {
                return Err(ValidationError::NegativeAmount {
                    field: "small blind",
                    value: b.small,
                });
            }
            if b.small > b.big {
                return Err(ValidationError::BlindOrder {
                    small: b.small,
                    big: b.big,
                });
            }
        }
        for (field, value) in [("pot", self.pot), ("hero stack", self.hero_stack)] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(ValidationError::NegativeAmount { field, value: v });
                }
            }
        }

        Ok(())
    }

    /// One-line human summary, e.g. `flop | hero Ah Ks | board Ad 7c 2s`.
    pub fn summary(&self) -> String {
        let hero = if self.hero_cards.is_empty() {
            "-".to_string()
        } else {
            format_cards(&self.hero_cards)
        };
        let board = if self.board_cards.is_empty() {
            "-".to_string()
        } else {
            format_cards(&self.board_cards)
        };
        format!("{} | hero {} | board {}", self.phase, hero, board)
    }
}
