//! # Error Types

use shared_types::entities::{Address, RoleId};
use thiserror::Error;

/// Errors raised by the module authority.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// Caller is not admitted for the authority scope.
    #[error("unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Account was the null address.
    #[error("zero address")]
    ZeroAddress,

    /// Role was never declared (or is the zero id).
    #[error("invalid role: {0}")]
    InvalidRole(RoleId),

    /// Role is already declared.
    #[error("role already exists: {0}")]
    RoleAlreadyExists(RoleId),
}

impl AuthorityError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::ZeroAddress => "zero_address",
            Self::InvalidRole(_) => "invalid_role",
            Self::RoleAlreadyExists(_) => "role_already_exists",
        }
    }
}
