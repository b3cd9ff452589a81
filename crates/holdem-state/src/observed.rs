use crate::card::Card;
use crate::state::Phase;
use serde::{Deserialize, Serialize};

/// A value read off the screen together with how much it is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observed<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> Observed<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Sparse state produced from a single frame. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedState {
    pub hero_cards: Option<Observed<Vec<Card>>>,
    pub board_cards: Option<Observed<Vec<Card>>>,
    pub phase: Option<Observed<Phase>>,
}

impl ObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hero_cards.is_none() && self.board_cards.is_none() && self.phase.is_none()
    }

    pub fn with_hero(mut self, cards: Vec<Card>, confidence: f64) -> Self {
        self.hero_cards = Some(Observed::new(cards, confidence));
        self
    }

    pub fn with_board(mut self, cards: Vec<Card>, confidence: f64) -> Self {
        self.board_cards = Some(Observed::new(cards, confidence));
        self
    }

    pub fn with_phase(mut self, phase: Phase, confidence: f64) -> Self {
        self.phase = Some(Observed::new(phase, confidence));
        self
    }
}

/// Externally supplied, already-validated state that outranks observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseState {
    pub state: crate::state::TableState,
    pub confidence: f64,
}
