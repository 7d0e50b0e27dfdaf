//! # Error Types
//!
//! Errors returned by the module registry.

use shared_types::entities::{Address, Keycode};
use thiserror::Error;

/// Errors raised by registry operations.
///
/// Every error aborts the whole call: the store is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller is not admitted for the registry scope.
    #[error("unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Keycode already maps to an implementation.
    #[error("module already registered: {0}")]
    AlreadyRegistered(Keycode),

    /// Keycode has no implementation.
    #[error("module not registered: {0}")]
    NotRegistered(Keycode),

    /// Implementation address was the null address.
    #[error("zero address")]
    ZeroAddress,

    /// Malformed input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dependency link already present.
    #[error("dependency already linked: {keycode} -> {dependency}")]
    DependencyAlreadyLinked { keycode: Keycode, dependency: Keycode },

    /// Dependency link absent.
    #[error("dependency not linked: {keycode} -> {dependency}")]
    DependencyNotLinked { keycode: Keycode, dependency: Keycode },
}

impl RegistryError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::NotRegistered(_) => "not_registered",
            Self::ZeroAddress => "zero_address",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::DependencyAlreadyLinked { .. } => "dependency_already_linked",
            Self::DependencyNotLinked { .. } => "dependency_not_linked",
        }
    }
}
