//! # ARK-01 Module Registry
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Maps opaque 32-byte keycodes to implementation addresses. Modules can be
//! upgraded in place (the keycode stays, the address and version change)
//! and linked to the modules they depend on.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A keycode maps to at most one implementation | `domain/registry.rs` - `register()` |
//! | Implementations are never the zero address | `domain/registry.rs` - `register()`, `upgrade()` |
//! | Dependencies are registered, distinct, never self | `domain/registry.rs` - `link_dependency()` |
//! | Failed calls leave no trace | `service.rs` - `commit()` via `transact` |
//!
//! ## Authorization
//!
//! All mutations require the injected policy to admit the caller for
//! `AdminScope::Registry`. Reads are unrestricted.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service.rs        - ModuleRegistryService (lock, UoW, publish) │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - ModuleRegistryApi trait                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/entities.rs   - ModuleEntry, RegistryOp                 │
//! │  domain/registry.rs   - ModuleRegistry store                    │
//! │  domain/invariants.rs - structural checks                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use ark_01_module_registry::prelude::*;
//!
//! registry.register(admin, keycode, implementation).await?;
//! let address = registry.get_implementation(keycode).await?;
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{check_all_invariants, ModuleEntry, ModuleRegistry, RegistryOp};
    pub use crate::errors::RegistryError;
    pub use crate::ports::ModuleRegistryApi;
    pub use crate::service::{create_test_service, ModuleRegistryService, ServiceStats};
}

pub use domain::{ModuleEntry, ModuleRegistry, RegistryOp};
pub use errors::RegistryError;
pub use ports::ModuleRegistryApi;
pub use service::{ModuleRegistryService, ServiceStats};

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = shared_bus::subsystem_ids::MODULE_REGISTRY;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Module Registry";
