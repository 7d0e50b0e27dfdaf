//! # ARK-02 Module Authority
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Holds the permission bits that say which account may call which function
//! selector on which module, plus a role layer (declared roles assigned to
//! accounts).
//!
//! ## Permission State Machine
//!
//! ```text
//! [unset] ──grant──→ [granted] ──revoke──→ [unset] ──grant──→ ...
//!              ↺ grant (no-op, still emits)   ↺ revoke (no-op, still emits)
//! ```
//!
//! Roles must be declared (at construction or through `create_role`) before
//! they can be assigned.
//!
//! ## Authorization
//!
//! Every mutation requires the injected policy to admit the caller for
//! `AdminScope::Authority`. Reads are unrestricted.

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
    pub use crate::domain::{AuthorityStore, PermissionKey};
    pub use crate::errors::AuthorityError;
    pub use crate::ports::ModuleAuthorityApi;
    pub use crate::service::{
        create_test_service, ModuleAuthorityService, ServiceConfig, ServiceStats,
    };
}

pub use domain::{AuthorityStore, PermissionKey};
pub use errors::AuthorityError;
pub use ports::ModuleAuthorityApi;
pub use service::{ModuleAuthorityService, ServiceConfig, ServiceStats};

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = shared_bus::subsystem_ids::MODULE_AUTHORITY;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Module Authority";
