//! # Centralized Authorization Policy
//!
//! Every admin-gated kernel operation asks an injected
//! [`AuthorizationPolicy`] whether the caller may act on a given
//! [`AdminScope`]. Subsystems never compare against a hardcoded admin
//! address themselves, so a deployment can swap the single-admin policy for
//! a signer set or a per-scope policy without touching business logic.
//!
//! | Policy | Admits |
//! |--------|--------|
//! | `SingleAdminPolicy` | exactly one address, every scope |
//! | `AdminSetPolicy` | any member of a fixed set, every scope |
//! | `ScopedPolicy` | a per-scope set, falling back to a default set |

use crate::entities::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// The administrative surface an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminScope {
    /// Module registration, upgrade and dependency links.
    Registry,
    /// Permission bits and role assignment.
    Authority,
    /// Validation rule bookkeeping.
    Validator,
    /// Event type registration and authorized publishers.
    EventTypes,
}

impl fmt::Display for AdminScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registry => "registry",
            Self::Authority => "authority",
            Self::Validator => "validator",
            Self::EventTypes => "event-types",
        };
        f.write_str(name)
    }
}

/// Decides whether a caller may perform an admin operation.
pub trait AuthorizationPolicy: Send + Sync {
    /// Returns true if `caller` may mutate state in `scope`.
    fn is_authorized(&self, caller: &Address, scope: AdminScope) -> bool;

    /// Short policy name for logs.
    fn name(&self) -> &'static str;
}

/// Shared handle to a policy.
pub type SharedPolicy = Arc<dyn AuthorizationPolicy>;

/// One admin address for every scope.
#[derive(Debug, Clone)]
pub struct SingleAdminPolicy {
    admin: Address,
}

impl SingleAdminPolicy {
    /// Creates a policy admitting only `admin`.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    /// The admitted address.
    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }
}

impl AuthorizationPolicy for SingleAdminPolicy {
    fn is_authorized(&self, caller: &Address, _scope: AdminScope) -> bool {
        *caller == self.admin
    }

    fn name(&self) -> &'static str {
        "single-admin"
    }
}

/// Any member of a fixed signer set, for every scope.
#[derive(Debug, Clone, Default)]
pub struct AdminSetPolicy {
    admins: BTreeSet<Address>,
}

impl AdminSetPolicy {
    /// Creates a policy from a set of addresses.
    pub fn new(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Number of admitted addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Returns true if no address is admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl AuthorizationPolicy for AdminSetPolicy {
    fn is_authorized(&self, caller: &Address, _scope: AdminScope) -> bool {
        self.admins.contains(caller)
    }

    fn name(&self) -> &'static str {
        "admin-set"
    }
}

/// A distinct admin set per scope, with a default set for unlisted scopes.
#[derive(Debug, Clone, Default)]
pub struct ScopedPolicy {
    default: BTreeSet<Address>,
    scopes: HashMap<AdminScope, BTreeSet<Address>>,
}

impl ScopedPolicy {
    /// Creates a policy whose unlisted scopes admit `default`.
    pub fn new(default: impl IntoIterator<Item = Address>) -> Self {
        Self {
            default: default.into_iter().collect(),
            scopes: HashMap::new(),
        }
    }

    /// Overrides the admin set for one scope.
    #[must_use]
    pub fn with_scope(mut self, scope: AdminScope, admins: impl IntoIterator<Item = Address>) -> Self {
        self.scopes.insert(scope, admins.into_iter().collect());
        self
    }
}

impl AuthorizationPolicy for ScopedPolicy {
    fn is_authorized(&self, caller: &Address, scope: AdminScope) -> bool {
        self.scopes
            .get(&scope)
            .unwrap_or(&self.default)
            .contains(caller)
    }

    fn name(&self) -> &'static str {
        "scoped"
    }
}
