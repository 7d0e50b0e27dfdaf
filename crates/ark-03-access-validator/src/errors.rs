//! # Error Types

use shared_types::entities::{Address, Keycode, RuleId, Selector};
use thiserror::Error;

/// Errors raised by the access validator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// Caller is not admitted for the validator scope.
    #[error("unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Rule id already attached to this (module, selector).
    #[error("rule {rule_id} already exists for {module}/{selector}")]
    RuleAlreadyExists {
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    },

    /// Rule id not attached to this (module, selector).
    #[error("rule {rule_id} not found for {module}/{selector}")]
    RuleNotFound {
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    },
}

impl ValidatorError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::RuleAlreadyExists { .. } => "rule_already_exists",
            Self::RuleNotFound { .. } => "rule_not_found",
        }
    }
}
