//! # Shared Types Crate
//!
//! Cross-subsystem definitions for the ARK kernel.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers used by more than one subsystem
//!   live here.
//! - **Injected Authority**: admin checks go through an
//!   [`AuthorizationPolicy`] rather than a hardcoded address.
//! - **Atomic Calls**: mutations are applied through a [`UnitOfWork`] so a
//!   failed call leaves no observable state change.

pub mod entities;
pub mod errors;
pub mod security;
pub mod time;
pub mod unit_of_work;

pub use entities::*;
pub use errors::*;
pub use security::*;
pub use time::*;
pub use unit_of_work::{apply, transact, Step, UnitOfWork};
