use crate::card::Card;
use crate::state::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic role a group of detected cards plays on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Hero,
    Board,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Hero => "hero",
            Role::Board => "board",
        })
    }
}

/// Fields the fuser knows how to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    HeroCards,
    BoardCards,
    Phase,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::HeroCards => "hero cards",
            Field::BoardCards => "board cards",
            Field::Phase => "phase",
        })
    }
}

/// Non-fatal finding surfaced next to a result. Warnings never block output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    NoTemplates,
    FrameTooSmall { width: u32, height: u32, min: u32 },
    NoDetections,
    UnmatchedRanks { count: usize },
    IgnoredBand { tokens: usize, y: u32 },
    AmbiguousRole { role: Role, candidates: usize },
    BoardNotAboveHero { board_y: u32, hero_y: u32 },
    DuplicateInGroup { role: Role, card: Card },
    UnknownPhase,
    Conflict { field: Field, base: String, observed: String },
    Malformed { field: Field, reason: String },
}

impl Warning {
    pub fn is_conflict_on(&self, f: Field) -> bool {
        matches!(self, Warning::Conflict { field, .. } if *field == f)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoTemplates => write!(f, "no glyph templates configured"),
            Warning::FrameTooSmall { width, height, min } => write!(
                f,
                "frame {}x{} is below the readable minimum of {}px",
                width, height, min
            ),
            Warning::NoDetections => write!(f, "no card glyphs detected"),
            Warning::UnmatchedRanks { count } => {
                write!(f, "{} rank glyph(s) had no adjacent suit and were dropped", count)
            }
            Warning::IgnoredBand { tokens, y } => {
                write!(f, "row at y={} holds {} card(s); not a hero or board row", y, tokens)
            }
            Warning::AmbiguousRole { role, candidates } => write!(
                f,
                "{} competing {} rows; {} omitted",
                candidates, role, role
            ),
            Warning::BoardNotAboveHero { board_y, hero_y } => write!(
                f,
                "board row at y={} is not above hero row at y={}; discarded",
                board_y, hero_y
            ),
            Warning::DuplicateInGroup { role, card } => {
                write!(f, "{} row contains {} twice; discarded", role, card)
            }
            Warning::UnknownPhase => write!(f, "phase could not be inferred"),
            Warning::Conflict {
                field,
                base,
                observed,
            } => write!(
                f,
                "{} conflict: kept {} over observed {}",
                field, base, observed
            ),
            Warning::Malformed { field, reason } => {
                write!(f, "observed {} ignored: {}", field, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_conflict() {
        let w = Warning::Conflict {
            field: Field::BoardCards,
            base: "Kc 7h 2h".into(),
            observed: "Qd 9s 4c".into(),
        };
        assert_eq!(
            w.to_string(),
            "board cards conflict: kept Kc 7h 2h over observed Qd 9s 4c"
        );
        assert!(w.is_conflict_on(Field::BoardCards));
        assert!(!w.is_conflict_on(Field::Phase));
    }
}
