//! # Driving Ports (API - Inbound)

use crate::domain::entities::ValidationRule;
use crate::errors::ValidatorError;
use async_trait::async_trait;
use shared_types::entities::{Address, Keycode, RuleId, Selector};

/// Primary API for the access validator.
#[async_trait]
pub trait AccessValidatorApi: Send + Sync {
    /// Attach an active rule to (module, selector).
    async fn add_rule(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        priority: u32,
    ) -> Result<(), ValidatorError>;

    /// Switch a rule on or off.
    async fn set_rule_active(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        active: bool,
    ) -> Result<(), ValidatorError>;

    /// Detach a rule.
    async fn remove_rule(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    ) -> Result<(), ValidatorError>;

    /// Rules of (module, selector) in insertion order.
    async fn get_rules(&self, module: Keycode, selector: Selector) -> Vec<ValidationRule>;

    /// Record an access check. Always returns `true`.
    async fn validate_access(&self, account: Address, module: Keycode, selector: Selector) -> bool;

    /// Validator-wide check count.
    async fn validation_count(&self) -> u64;

    /// Check count for one (module, selector).
    async fn validation_count_for(&self, module: Keycode, selector: Selector) -> u64;
}
