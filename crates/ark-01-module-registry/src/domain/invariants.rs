//! # Registry Invariants
//!
//! Structural checks over a [`ModuleRegistry`]. The store maintains them by
//! construction; tests and property tests assert them after arbitrary
//! operation sequences.

use crate::domain::registry::ModuleRegistry;
use shared_types::entities::Keycode;
use thiserror::Error;

/// A broken structural invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// An entry holds the null implementation.
    #[error("module {0} has a zero implementation")]
    ZeroImplementation(Keycode),

    /// Order list and map disagree.
    #[error("registration order out of sync: {order} ordered, {stored} stored")]
    OrderMismatch { order: usize, stored: usize },

    /// A dependency points at an unregistered module or at itself.
    #[error("module {keycode} has dangling dependency {dependency}")]
    DanglingDependency { keycode: Keycode, dependency: Keycode },

    /// A dependency appears twice.
    #[error("module {keycode} links {dependency} more than once")]
    DuplicateDependency { keycode: Keycode, dependency: Keycode },

    /// Version went below 1.
    #[error("module {0} has version 0")]
    ZeroVersion(Keycode),
}

/// Runs every check and returns all violations found.
#[must_use]
pub fn check_all_invariants(registry: &ModuleRegistry) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let stored = registry.len();
    let order = registry.order().len();
    if order != stored || registry.iter().count() != stored {
        violations.push(InvariantViolation::OrderMismatch { order, stored });
    }

    for entry in registry.iter() {
        if entry.implementation.is_zero() {
            violations.push(InvariantViolation::ZeroImplementation(entry.keycode));
        }
        if entry.version == 0 {
            violations.push(InvariantViolation::ZeroVersion(entry.keycode));
        }
        for (i, dependency) in entry.dependencies.iter().enumerate() {
            if *dependency == entry.keycode || !registry.contains(dependency) {
                violations.push(InvariantViolation::DanglingDependency {
                    keycode: entry.keycode,
                    dependency: *dependency,
                });
            }
            if entry.dependencies[..i].contains(dependency) {
                violations.push(InvariantViolation::DuplicateDependency {
                    keycode: entry.keycode,
                    dependency: *dependency,
                });
            }
        }
    }

    violations
}
