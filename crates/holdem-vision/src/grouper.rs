//! Assigns detected tokens to the hero and board roles by screen row.

use crate::detector::CardToken;
use holdem_state::{Card, ObservedState, Phase, Role, Warning};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Confidence attached to an inferred phase. It is derived from the board
/// count rather than read directly, so it sits below detector confidences.
pub const PHASE_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrouperConfig {
    /// Height of a row band in pixels, measured from the band's top token.
    pub band_height: u32,
    /// Minimum vertical gap by which the board row must sit above the hero row.
    pub board_margin: u32,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            band_height: 12,
            board_margin: 12,
        }
    }
}

/// Tokens sharing one horizontal band, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub y: u32,
    pub tokens: Vec<CardToken>,
}

impl Band {
    /// Cards of the row, left to right.
    pub fn cards(&self) -> Vec<Card> {
        self.tokens.iter().map(|t| t.card).collect()
    }

    pub fn confidence(&self) -> f64 {
        self.tokens
            .iter()
            .map(|t| t.confidence)
            .fold(f64::INFINITY, f64::min)
    }

    fn duplicate(&self) -> Option<Card> {
        let mut seen = HashSet::new();
        self.tokens.iter().map(|t| t.card).find(|c| !seen.insert(*c))
    }
}

/// Result of grouping one frame's tokens.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub observed: ObservedState,
    pub hero: Option<Band>,
    pub board: Option<Band>,
    pub warnings: Vec<Warning>,
}

pub struct RoleGrouper {
    config: GrouperConfig,
}

impl RoleGrouper {
    pub fn new(config: GrouperConfig) -> Self {
        Self { config }
    }

    /// Split tokens into fixed-height bands: sorted top to bottom, a token
    /// joins the current band while it lies within `band_height` of the
    /// band's first token.
    pub fn bands(&self, tokens: &[CardToken]) -> Vec<Band> {
        let mut sorted: Vec<CardToken> = tokens.to_vec();
        sorted.sort_by_key(|t| (t.y, t.x));

        let height = self.config.band_height.max(1);
        let mut bands: Vec<Band> = Vec::new();
        for token in sorted {
            match bands.last_mut() {
                Some(band) if token.y < band.y.saturating_add(height) => {
                    band.tokens.push(token)
                }
                _ => bands.push(Band {
                    y: token.y,
                    tokens: vec![token],
                }),
            }
        }
        for band in &mut bands {
            band.tokens.sort_by_key(|t| t.x);
        }
        bands
    }

    /// Assign roles and infer the phase. Ambiguous or inconsistent rows are
    /// omitted with a warning, never guessed.
    pub fn group(&self, tokens: &[CardToken]) -> Grouping {
        let mut warnings = Vec::new();
        let mut hero_candidates = Vec::new();
        let mut board_candidates = Vec::new();

        for band in self.bands(tokens) {
            match band.tokens.len() {
                2 => hero_candidates.push(band),
                3..=5 => board_candidates.push(band),
                n => warnings.push(Warning::IgnoredBand { tokens: n, y: band.y }),
            }
        }

        let mut hero = single(hero_candidates, Role::Hero, &mut warnings);
        let mut board = single(board_candidates, Role::Board, &mut warnings);

        if let (Some(b), Some(h)) = (&board, &hero) {
            if b.y.saturating_add(self.config.board_margin) > h.y {
                warnings.push(Warning::BoardNotAboveHero {
                    board_y: b.y,
                    hero_y: h.y,
                });
                board = None;
            }
        }

        for (slot, role) in [(&mut hero, Role::Hero), (&mut board, Role::Board)] {
            if let Some(card) = slot.as_ref().and_then(Band::duplicate) {
                warnings.push(Warning::DuplicateInGroup { role, card });
                *slot = None;
            }
        }

        let phase = match (&board, &hero) {
            (Some(b), _) => Phase::from_board_len(b.tokens.len()).unwrap_or(Phase::Unknown),
            (None, Some(_)) => Phase::Preflop,
            (None, None) => Phase::Unknown,
        };

        let mut observed = ObservedState::new();
        if let Some(h) = &hero {
            observed = observed.with_hero(h.cards(), h.confidence());
        }
        if let Some(b) = &board {
            observed = observed.with_board(b.cards(), b.confidence());
        }
        if phase == Phase::Unknown {
            warnings.push(Warning::UnknownPhase);
        } else {
            observed = observed.with_phase(phase, PHASE_CONFIDENCE);
        }

        debug!(
            "Grouped: hero={} board={} phase={}",
            hero.is_some(),
            board.as_ref().map_or(0, |b| b.tokens.len()),
            phase
        );

        Grouping {
            observed,
            hero,
            board,
            warnings,
        }
    }
}

fn single(mut candidates: Vec<Band>, role: Role, warnings: &mut Vec<Warning>) -> Option<Band> {
    match candidates.len() {
        0 => None,
        1 => candidates.pop(),
        n => {
            warnings.push(Warning::AmbiguousRole {
                role,
                candidates: n,
            });
            None
        }
    }
}
