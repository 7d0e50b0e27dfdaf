//! # Registry Entities

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, Keycode, Timestamp};

/// A registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Module identifier.
    pub keycode: Keycode,
    /// Current implementation address. Never zero.
    pub implementation: Address,
    /// Linked dependencies in link order.
    pub dependencies: Vec<Keycode>,
    /// When the module was first registered.
    pub registered_at: Timestamp,
    /// When the implementation was last replaced.
    pub upgraded_at: Option<Timestamp>,
    /// Starts at 1, bumped by every upgrade.
    pub version: u32,
}

impl ModuleEntry {
    /// Creates a version-1 entry with no dependencies.
    #[must_use]
    pub fn new(keycode: Keycode, implementation: Address, now: Timestamp) -> Self {
        Self {
            keycode,
            implementation,
            dependencies: Vec::new(),
            registered_at: now,
            upgraded_at: None,
            version: 1,
        }
    }

    /// Returns true if `dependency` is linked.
    #[must_use]
    pub fn depends_on(&self, dependency: &Keycode) -> bool {
        self.dependencies.contains(dependency)
    }
}

/// A single registry mutation. Batches are lists of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryOp {
    /// Register a new module.
    Register {
        keycode: Keycode,
        implementation: Address,
    },
    /// Replace an implementation.
    Upgrade {
        keycode: Keycode,
        implementation: Address,
    },
    /// Link `dependency` to `keycode`.
    LinkDependency { keycode: Keycode, dependency: Keycode },
    /// Unlink `dependency` from `keycode`.
    UnlinkDependency { keycode: Keycode, dependency: Keycode },
}

impl RegistryOp {
    /// The module the operation targets.
    #[must_use]
    pub fn keycode(&self) -> Keycode {
        match self {
            Self::Register { keycode, .. }
            | Self::Upgrade { keycode, .. }
            | Self::LinkDependency { keycode, .. }
            | Self::UnlinkDependency { keycode, .. } => *keycode,
        }
    }

    /// Operation name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Upgrade { .. } => "upgrade",
            Self::LinkDependency { .. } => "register_dependency",
            Self::UnlinkDependency { .. } => "remove_dependency",
        }
    }
}
