use holdem_state::BaseState;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Supplies the higher-trust state for a table, when one is known.
pub trait BaseStateSource: Send + Sync {
    fn base_state(&self, table: &str) -> Option<BaseState>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseState;

impl BaseStateSource for NoBaseState {
    fn base_state(&self, _table: &str) -> Option<BaseState> {
        None
    }
}

/// Base states set by hand, per table.
#[derive(Debug, Default)]
pub struct StaticBaseState {
    states: RwLock<HashMap<String, BaseState>>,
}

impl StaticBaseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, table: &str, base: BaseState) {
        self.states.write().insert(table.to_string(), base);
    }

    pub fn clear(&self, table: &str) {
        self.states.write().remove(table);
    }
}

impl BaseStateSource for StaticBaseState {
    fn base_state(&self, table: &str) -> Option<BaseState> {
        self.states.read().get(table).cloned()
    }
}
