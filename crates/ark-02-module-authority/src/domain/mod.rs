//! # Domain Layer
//!
//! Permission bits and role assignments. Pure and synchronous.

pub mod entities;
pub mod store;

pub use entities::PermissionKey;
pub use store::AuthorityStore;
