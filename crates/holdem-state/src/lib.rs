//! Canonical table state shared by the vision, fusion and monitoring layers.

pub mod card;
pub mod fingerprint;
pub mod fuse;
pub mod observed;
pub mod state;
pub mod warning;

pub use card::{format_cards, parse_cards, Card, Rank, Suit};
pub use fingerprint::Fingerprint;
pub use fuse::{fuse, Fusion};
pub use observed::{BaseState, Observed, ObservedState};
pub use state::{Blinds, Phase, TableState, ValidationError};
pub use warning::{Field, Role, Warning};
