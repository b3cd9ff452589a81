//! Collaborators the monitor hands fused states to: a policy gate, a
//! recommender, an output sink and an optional source of base states.

pub mod base;
pub mod policy;
pub mod recommend;
pub mod sink;

pub use base::{BaseStateSource, NoBaseState, StaticBaseState};
pub use policy::{Mode, ModePolicy, PolicyDecision, PolicyGate, PolicyRequest, TriggerKind};
pub use recommend::{Recommendation, Recommender, SummaryRecommender};
pub use sink::{ConsoleSink, MemorySink, OutputSink, TracingSink};
