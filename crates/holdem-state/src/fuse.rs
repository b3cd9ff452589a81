//! Merging a trusted base state with a lower-trust observation.
//!
//! Precedence per field: with no base the observation is authoritative; with
//! a base, set fields are kept and disagreements are reported, unset fields
//! are filled from the observation. Only fields taken from the observation
//! contribute to the aggregate confidence.

use crate::card::{format_cards, Card};
use crate::observed::ObservedState;
use crate::state::{Phase, TableState, ValidationError};
use crate::warning::{Field, Warning};
use std::collections::HashSet;
use tracing::debug;

/// Aggregate confidence when a base exists and nothing new was accepted.
pub const FULL_TRUST: f64 = 1.0;

/// Result of one fusion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Fusion {
    pub state: TableState,
    pub confidence: f64,
    pub warnings: Vec<Warning>,
    /// Fields taken from the observation, in merge order.
    pub adopted: Vec<Field>,
}

struct Adoptions {
    entries: Vec<(Field, f64)>,
}

impl Adoptions {
    fn record(&mut self, field: Field, confidence: f64) {
        debug!("Adopted observed {} (confidence {:.3})", field, confidence);
        self.entries.push((field, confidence));
    }

    fn confidence_of(&self, field: Field) -> Option<f64> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
    }

    fn aggregate(&self, had_base: bool) -> f64 {
        if self.entries.is_empty() {
            return if had_base { FULL_TRUST } else { 0.0 };
        }
        self.entries
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Fuse an optional base state with an observed partial state.
///
/// The merged state is always re-validated; an invariant violation is
/// returned as an error and never patched up.
pub fn fuse(base: Option<&TableState>, observed: &ObservedState) -> Result<Fusion, ValidationError> {
    let had_base = base.is_some();
    let mut state = base.cloned().unwrap_or_default();
    let mut warnings = Vec::new();
    let mut adopted = Adoptions {
        entries: Vec::new(),
    };

    if let Some(obs) = &observed.hero_cards {
        match check_cards(&obs.value, 2..=2) {
            Err(reason) => warnings.push(Warning::Malformed {
                field: Field::HeroCards,
                reason,
            }),
            Ok(()) if state.hero_cards.is_empty() => {
                state.hero_cards = obs.value.clone();
                adopted.record(Field::HeroCards, obs.confidence);
            }
            Ok(()) if state.hero_cards != obs.value => {
                warnings.push(conflict_cards(Field::HeroCards, &state.hero_cards, &obs.value));
            }
            Ok(()) => {}
        }
    }

    if let Some(obs) = &observed.board_cards {
        match check_cards(&obs.value, 3..=5) {
            Err(reason) => warnings.push(Warning::Malformed {
                field: Field::BoardCards,
                reason,
            }),
            Ok(()) if state.board_cards.is_empty() => {
                state.board_cards = obs.value.clone();
                adopted.record(Field::BoardCards, obs.confidence);
            }
            Ok(()) if state.board_cards != obs.value => {
                warnings.push(conflict_cards(Field::BoardCards, &state.board_cards, &obs.value));
            }
            Ok(()) => {}
        }
    }

    merge_phase(&mut state, observed, &mut adopted, &mut warnings);

    state.validate()?;

    let confidence = adopted.aggregate(had_base);
    Ok(Fusion {
        state,
        confidence,
        warnings,
        adopted: adopted.entries.iter().map(|(f, _)| *f).collect(),
    })
}

/// Phase is derived from the board, so it may only move forward from its
/// initial value and must agree with the merged board.
fn merge_phase(
    state: &mut TableState,
    observed: &ObservedState,
    adopted: &mut Adoptions,
    warnings: &mut Vec<Warning>,
) {
    let implied = Phase::from_board_len(state.board_cards.len());

    match &observed.phase {
        Some(obs) if obs.value == Phase::Unknown => warnings.push(Warning::Malformed {
            field: Field::Phase,
            reason: "observed phase is unknown".to_string(),
        }),
        Some(obs) if obs.value == state.phase => {}
        Some(obs) if !state.phase.is_initial() => warnings.push(Warning::Conflict {
            field: Field::Phase,
            base: state.phase.to_string(),
            observed: obs.value.to_string(),
        }),
        Some(obs) if implied != Some(obs.value) => warnings.push(Warning::Malformed {
            field: Field::Phase,
            reason: format!(
                "{} disagrees with {} board card(s)",
                obs.value,
                state.board_cards.len()
            ),
        }),
        Some(obs) => {
            state.phase = obs.value;
            adopted.record(Field::Phase, obs.confidence);
        }
        None => {
            // Back-fill from a board adopted in this call.
            if let (Some(phase), Some(conf)) = (implied, adopted.confidence_of(Field::BoardCards)) {
                if state.phase.is_initial() && state.phase != phase {
                    state.phase = phase;
                    adopted.record(Field::Phase, conf);
                }
            }
        }
    }
}

fn check_cards(cards: &[Card], len: std::ops::RangeInclusive<usize>) -> Result<(), String> {
    if !len.contains(&cards.len()) {
        return Err(format!(
            "expected {}..={} cards, got {}",
            len.start(),
            len.end(),
            cards.len()
        ));
    }
    let mut seen = HashSet::new();
    for card in cards {
        if !seen.insert(card) {
            return Err(format!("duplicate card {}", card));
        }
    }
    Ok(())
}

fn conflict_cards(field: Field, base: &[Card], observed: &[Card]) -> Warning {
    debug!(
        "Conflict on {}: base [{}] vs observed [{}]",
        field,
        format_cards(base),
        format_cards(observed)
    );
    Warning::Conflict {
        field,
        base: format_cards(base),
        observed: format_cards(observed),
    }
}
