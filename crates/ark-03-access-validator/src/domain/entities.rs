//! # Validator Entities

use serde::{Deserialize, Serialize};
use shared_types::entities::RuleId;

/// A rule attached to a (module, selector) pair.
///
/// Stored and listed, never evaluated: access checks always permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub rule_id: RuleId,
    pub is_active: bool,
    pub priority: u32,
}

impl ValidationRule {
    /// A new, active rule.
    #[must_use]
    pub fn new(rule_id: RuleId, priority: u32) -> Self {
        Self {
            rule_id,
            is_active: true,
            priority,
        }
    }
}
