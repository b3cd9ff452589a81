use anyhow::Result;
use holdem_state::TableState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How strictly advice is gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Advice only on an explicit operator request.
    #[default]
    Ethical,
    Permissive,
}

impl Mode {
    /// Whether emission requires a pending trigger.
    pub fn is_strict(self) -> bool {
        matches!(self, Mode::Ethical)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ethical => write!(f, "ethical"),
            Mode::Permissive => write!(f, "permissive"),
        }
    }
}

/// What caused a table to be considered for emission. Ordered by precedence:
/// an explicit request outranks a detected change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    None,
    ChangeDetected,
    Explicit,
}

impl TriggerKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TriggerKind::None,
            1 => TriggerKind::ChangeDetected,
            _ => TriggerKind::Explicit,
        }
    }

    pub fn is_pending(self) -> bool {
        self != TriggerKind::None
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::None => write!(f, "none"),
            TriggerKind::ChangeDetected => write!(f, "change_detected"),
            TriggerKind::Explicit => write!(f, "explicit"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    pub state: &'a TableState,
    pub trigger: TriggerKind,
    pub mode: Mode,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: String,
    /// Text shown to the operator, mostly relevant on denial.
    pub message: String,
    pub audit_tags: Vec<String>,
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            message: String::new(),
            audit_tags: Vec::new(),
        }
    }

    pub fn deny(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            message: message.into(),
            audit_tags: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.audit_tags.push(tag.into());
        self
    }
}

/// Decides whether advice may be shown for a fused state.
pub trait PolicyGate: Send + Sync {
    fn evaluate(&self, request: &PolicyRequest<'_>) -> Result<PolicyDecision>;
}

/// Stock policy: ethical mode allows only explicit requests, permissive mode
/// allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModePolicy;

impl PolicyGate for ModePolicy {
    fn evaluate(&self, request: &PolicyRequest<'_>) -> Result<PolicyDecision> {
        let decision = match (request.mode, request.trigger) {
            (Mode::Permissive, _) => PolicyDecision::allow("permissive mode"),
            (Mode::Ethical, TriggerKind::Explicit) => PolicyDecision::allow("explicit request"),
            (Mode::Ethical, _) => PolicyDecision::deny(
                "explicit request required",
                "Advice is only shown on request. Press Enter to ask for this hand.",
            ),
        };
        Ok(decision
            .tagged(format!("mode:{}", request.mode))
            .tagged(format!("trigger:{}", request.trigger)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(state: &TableState, mode: Mode, trigger: TriggerKind) -> PolicyRequest<'_> {
        PolicyRequest {
            state,
            trigger,
            mode,
            confidence: 0.95,
        }
    }

    #[test]
    fn test_trigger_precedence() {
        assert!(TriggerKind::Explicit > TriggerKind::ChangeDetected);
        assert!(TriggerKind::ChangeDetected > TriggerKind::None);
        for kind in [TriggerKind::None, TriggerKind::ChangeDetected, TriggerKind::Explicit] {
            assert_eq!(TriggerKind::from_u8(kind.as_u8()), kind);
        }
        assert!(!TriggerKind::None.is_pending());
    }

    #[test]
    fn test_ethical_requires_explicit() {
        let state = TableState::new();
        let denied = ModePolicy
            .evaluate(&request(&state, Mode::Ethical, TriggerKind::ChangeDetected))
            .unwrap();
        assert!(!denied.allowed);
        assert!(!denied.message.is_empty());
        assert!(denied.audit_tags.contains(&"trigger:change_detected".to_string()));

        let allowed = ModePolicy
            .evaluate(&request(&state, Mode::Ethical, TriggerKind::Explicit))
            .unwrap();
        assert!(allowed.allowed);
    }

    #[test]
    fn test_permissive_allows_untriggered() {
        let state = TableState::new();
        let decision = ModePolicy
            .evaluate(&request(&state, Mode::Permissive, TriggerKind::None))
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.audit_tags, vec!["mode:permissive", "trigger:none"]);
    }

    #[test]
    fn test_mode_serde() {
        let mode: Mode = serde_json::from_str("\"permissive\"").unwrap();
        assert_eq!(mode, Mode::Permissive);
        assert_eq!(serde_json::to_string(&Mode::Ethical).unwrap(), "\"ethical\"");
        assert!(Mode::Ethical.is_strict());
    }
}
