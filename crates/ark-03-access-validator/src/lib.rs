//! # ARK-03 Module Access Validator
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! Keeps an ordered list of prioritized validation rules per
//! (module, selector) and answers access checks.
//!
//! ## Access Checks
//!
//! `validate_access` **always returns `true`**. Stored rules (active or not,
//! whatever their priority) are listed and managed but never consulted by
//! the check. Each call still increments the validator-wide counter and the
//! per-(module, selector) counter and publishes `AccessValidated`.
//!
//! ## Authorization
//!
//! Rule mutations require the injected policy to admit the caller for
//! `AdminScope::Validator`. Access checks and reads are open.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{RuleBook, ValidationRule};
    pub use crate::errors::ValidatorError;
    pub use crate::ports::AccessValidatorApi;
    pub use crate::service::{create_test_service, AccessValidatorService};
}

pub use domain::{RuleBook, ValidationRule};
pub use errors::ValidatorError;
pub use ports::AccessValidatorApi;
pub use service::AccessValidatorService;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = shared_bus::subsystem_ids::ACCESS_VALIDATOR;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Module Access Validator";
