use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::targets::TargetKind;

/// Presentation hints for rendering a target type in a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    pub kind: TargetKind,
    pub display_name: &'static str,
    pub icon: &'static str,
}

/// Per-dispatch context handed down by the orchestrator. Used for log correlation only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchContext {
    pub target_name: String,
}

impl DispatchContext {
    pub fn for_target(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
        }
    }
}

/// Result of a fully accepted dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// Number of instances submitted and acknowledged.
    pub stored: usize,
    /// Status text; empty on success.
    pub message: String,
}

impl DispatchOutcome {
    pub fn success(stored: usize) -> Self {
        Self {
            stored,
            message: String::new(),
        }
    }
}

/// Capability name to outcome. Every probed capability resolves to a definite bool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeResult(BTreeMap<String, bool>);

impl ProbeResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: &str, outcome: bool) {
        self.0.insert(capability.to_string(), outcome);
    }

    pub fn get(&self, capability: &str) -> Option<bool> {
        self.0.get(capability).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_result_serializes_as_map() {
        let mut result = ProbeResult::new();
        result.insert("authentication", true);
        result.insert("QIDO_query", false);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"authentication": true, "QIDO_query": false}));
        assert_eq!(result.get("authentication"), Some(true));
        assert_eq!(result.get("ping"), None);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_success_outcome_has_empty_message() {
        let outcome = DispatchOutcome::success(4);
        assert_eq!(outcome.stored, 4);
        assert!(outcome.message.is_empty());
    }
}
