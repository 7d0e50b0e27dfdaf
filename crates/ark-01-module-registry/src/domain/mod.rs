//! # Domain Layer
//!
//! Pure registry state machine. No I/O, no async, no authorization.

pub mod entities;
pub mod invariants;
pub mod registry;

pub use entities::{ModuleEntry, RegistryOp};
pub use invariants::{check_all_invariants, InvariantViolation};
pub use registry::ModuleRegistry;
