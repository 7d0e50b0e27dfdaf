//! # Rule Book
//!
//! Rule lists per (module, selector) and the access-check counters.

use crate::domain::entities::ValidationRule;
use crate::errors::ValidatorError;
use shared_types::entities::{Keycode, RuleId, Selector};
use std::collections::HashMap;

type Pair = (Keycode, Selector);

/// Rule storage plus validation counters.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: HashMap<Pair, Vec<ValidationRule>>,
    total_validations: u64,
    validations: HashMap<Pair, u64>,
}

impl RuleBook {
    /// Creates an empty rule book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an active rule.
    ///
    /// # Errors
    ///
    /// `RuleAlreadyExists` if the id is already attached to the pair.
    pub fn add_rule(
        &mut self,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        priority: u32,
    ) -> Result<(), ValidatorError> {
        let list = self.rules.entry((module, selector)).or_default();
        if list.iter().any(|r| r.rule_id == rule_id) {
            return Err(ValidatorError::RuleAlreadyExists {
                module,
                selector,
                rule_id,
            });
        }
        list.push(ValidationRule::new(rule_id, priority));
        Ok(())
    }

    /// Switches a rule on or off.
    ///
    /// # Errors
    ///
    /// `RuleNotFound` if the id is not attached to the pair.
    pub fn set_rule_active(
        &mut self,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        active: bool,
    ) -> Result<(), ValidatorError> {
        let rule = self
            .rules
            .get_mut(&(module, selector))
            .and_then(|list| list.iter_mut().find(|r| r.rule_id == rule_id))
            .ok_or(ValidatorError::RuleNotFound {
                module,
                selector,
                rule_id,
            })?;
        rule.is_active = active;
        Ok(())
    }

    /// Detaches a rule, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// `RuleNotFound` if the id is not attached to the pair.
    pub fn remove_rule(
        &mut self,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    ) -> Result<ValidationRule, ValidatorError> {
        let not_found = ValidatorError::RuleNotFound {
            module,
            selector,
            rule_id,
        };
        let list = self.rules.get_mut(&(module, selector)).ok_or(not_found.clone())?;
        let position = list
            .iter()
            .position(|r| r.rule_id == rule_id)
            .ok_or(not_found)?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.rules.remove(&(module, selector));
        }
        Ok(removed)
    }

    /// Rules of a pair in insertion order.
    #[must_use]
    pub fn rules(&self, module: &Keycode, selector: &Selector) -> &[ValidationRule] {
        self.rules
            .get(&(*module, *selector))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Records one access check and returns the new validator-wide total.
    ///
    /// Stored rules are not consulted.
    pub fn record_validation(&mut self, module: Keycode, selector: Selector) -> u64 {
        self.total_validations += 1;
        *self.validations.entry((module, selector)).or_insert(0) += 1;
        self.total_validations
    }

    /// Validator-wide check count.
    #[must_use]
    pub fn total_validations(&self) -> u64 {
        self.total_validations
    }

    /// Check count for one pair.
    #[must_use]
    pub fn validations_for(&self, module: &Keycode, selector: &Selector) -> u64 {
        self.validations
            .get(&(*module, *selector))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Keycode {
        Keycode::from_leading_byte(0xA1)
    }

    fn selector() -> Selector {
        Selector::from_u32(0xdead_beef)
    }

    fn rule(n: u8) -> RuleId {
        RuleId::keccak(&[n])
    }

    #[test]
    fn test_rules_keep_insertion_order() {
        let mut book = RuleBook::new();
        book.add_rule(module(), selector(), rule(1), 50).unwrap();
        book.add_rule(module(), selector(), rule(2), 10).unwrap();
        book.add_rule(module(), selector(), rule(3), 99).unwrap();

        let ids: Vec<RuleId> = book.rules(&module(), &selector()).iter().map(|r| r.rule_id).collect();
        assert_eq!(ids, vec![rule(1), rule(2), rule(3)]);

        book.remove_rule(module(), selector(), rule(1)).unwrap();
        let ids: Vec<RuleId> = book.rules(&module(), &selector()).iter().map(|r| r.rule_id).collect();
        assert_eq!(ids, vec![rule(2), rule(3)]);
    }

    #[test]
    fn test_duplicate_and_missing_rules() {
        let mut book = RuleBook::new();
        book.add_rule(module(), selector(), rule(1), 1).unwrap();
        assert!(matches!(
            book.add_rule(module(), selector(), rule(1), 2),
            Err(ValidatorError::RuleAlreadyExists { .. })
        ));
        assert!(matches!(
            book.set_rule_active(module(), selector(), rule(9), false),
            Err(ValidatorError::RuleNotFound { .. })
        ));
        assert!(matches!(
            book.remove_rule(module(), Selector::from_u32(1), rule(1)),
            Err(ValidatorError::RuleNotFound { .. })
        ));
    }

    #[test]
    fn test_same_rule_id_on_other_selector() {
        let mut book = RuleBook::new();
        book.add_rule(module(), selector(), rule(1), 1).unwrap();
        book.add_rule(module(), Selector::from_u32(7), rule(1), 1).unwrap();
        assert_eq!(book.rules(&module(), &Selector::from_u32(7)).len(), 1);
    }

    #[test]
    fn test_toggle_rule() {
        let mut book = RuleBook::new();
        book.add_rule(module(), selector(), rule(1), 1).unwrap();
        book.set_rule_active(module(), selector(), rule(1), false).unwrap();
        assert!(!book.rules(&module(), &selector())[0].is_active);
    }

    #[test]
    fn test_record_validation_counts() {
        let mut book = RuleBook::new();
        assert_eq!(book.record_validation(module(), selector()), 1);
        assert_eq!(book.record_validation(module(), Selector::from_u32(1)), 2);
        assert_eq!(book.record_validation(module(), selector()), 3);

        assert_eq!(book.total_validations(), 3);
        assert_eq!(book.validations_for(&module(), &selector()), 2);
        assert_eq!(book.validations_for(&Keycode::from_leading_byte(1), &selector()), 0);
    }
}
