use crate::state::TableState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic content hash of a canonical state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// SHA-256 over the state's JSON encoding. Field order is fixed by the
    /// struct definition, so equal states always hash equal.
    pub fn of(state: &TableState) -> Self {
        let bytes = serde_json::to_vec(state).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;
    use crate::state::Phase;

    #[test]
    fn test_equal_states_equal_fingerprints() {
        let a = TableState {
            hero_cards: parse_cards("Ah Ks").unwrap(),
            phase: Phase::Preflop,
            ..TableState::default()
        };
        let b = a.clone();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_eq!(Fingerprint::of(&a).as_str().len(), 64);
    }

    #[test]
    fn test_any_change_changes_fingerprint() {
        let a = TableState {
            hero_cards: parse_cards("Ah Ks").unwrap(),
            phase: Phase::Preflop,
            ..TableState::default()
        };
        let mut b = a.clone();
        b.pot = Some(3.0);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
        let mut c = a.clone();
        c.hero_cards = parse_cards("Ah Kd").unwrap();
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&c));
    }
}
