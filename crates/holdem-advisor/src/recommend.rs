use anyhow::Result;
use holdem_state::{format_cards, TableState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub sizing: Option<f64>,
    pub confidence: f64,
    pub key_facts: Vec<String>,
}

/// Turns a canonical state into advice.
pub trait Recommender: Send + Sync {
    fn recommend(&self, state: &TableState) -> Result<Recommendation>;
}

/// Carries no strategy. Restates what was read so the operator can check it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRecommender;

impl Recommender for SummaryRecommender {
    fn recommend(&self, state: &TableState) -> Result<Recommendation> {
        let mut key_facts = vec![format!("phase: {}", state.phase)];
        if !state.hero_cards.is_empty() {
            key_facts.push(format!("hero: {}", format_cards(&state.hero_cards)));
        }
        if !state.board_cards.is_empty() {
            key_facts.push(format!("board: {}", format_cards(&state.board_cards)));
        }
        if let Some(blinds) = &state.blinds {
            key_facts.push(format!("blinds: {}/{}", blinds.small, blinds.big));
        }
        if let Some(pot) = state.pot {
            key_facts.push(format!("pot: {}", pot));
        }
        if let Some(stack) = state.hero_stack {
            key_facts.push(format!("stack: {}", stack));
        }
        if let Some(id) = &state.hand_id {
            key_facts.push(format!("hand: {}", id));
        }

        Ok(Recommendation {
            action: "review".to_string(),
            sizing: None,
            confidence: 1.0,
            key_facts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_state::{parse_cards, Phase};

    #[test]
    fn test_summary_lists_known_fields() {
        let state = TableState {
            hero_cards: parse_cards("Ah Ks").unwrap(),
            board_cards: parse_cards("Ad 7c 2s").unwrap(),
            phase: Phase::Flop,
            pot: Some(12.5),
            ..TableState::new()
        };
        let rec = SummaryRecommender.recommend(&state).unwrap();
        assert_eq!(rec.action, "review");
        assert_eq!(rec.confidence, 1.0);
        assert_eq!(
            rec.key_facts,
            vec!["phase: flop", "hero: Ah Ks", "board: Ad 7c 2s", "pot: 12.5"]
        );
    }

    #[test]
    fn test_summary_of_empty_state() {
        let rec = SummaryRecommender.recommend(&TableState::new()).unwrap();
        assert_eq!(rec.key_facts, vec!["phase: unknown"]);
    }
}
