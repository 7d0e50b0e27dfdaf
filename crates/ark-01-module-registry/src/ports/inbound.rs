//! # Driving Ports (API - Inbound)
//!
//! The registry's public surface. Mutations take the calling account
//! explicitly; reads are unrestricted and side-effect free.

use crate::domain::entities::{ModuleEntry, RegistryOp};
use crate::errors::RegistryError;
use async_trait::async_trait;
use shared_types::entities::{Address, Keycode};

/// Primary API for the module registry.
#[async_trait]
pub trait ModuleRegistryApi: Send + Sync {
    /// Register `keycode` -> `implementation`.
    async fn register(
        &self,
        caller: Address,
        keycode: Keycode,
        implementation: Address,
    ) -> Result<(), RegistryError>;

    /// Replace the implementation of a registered module.
    async fn upgrade(
        &self,
        caller: Address,
        keycode: Keycode,
        implementation: Address,
    ) -> Result<(), RegistryError>;

    /// Link `dependency` to `keycode`.
    async fn register_dependency(
        &self,
        caller: Address,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError>;

    /// Unlink `dependency` from `keycode`.
    async fn remove_dependency(
        &self,
        caller: Address,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError>;

    /// Apply several operations as one unit of work.
    ///
    /// Returns the number of operations applied. On error nothing is applied.
    async fn execute_batch(
        &self,
        caller: Address,
        ops: Vec<RegistryOp>,
    ) -> Result<usize, RegistryError>;

    /// Current implementation of a module.
    async fn get_implementation(&self, keycode: Keycode) -> Result<Address, RegistryError>;

    /// Dependencies of a module in link order.
    async fn get_all_dependencies(&self, keycode: Keycode) -> Result<Vec<Keycode>, RegistryError>;

    /// Full entry of a module.
    async fn get_module(&self, keycode: Keycode) -> Result<ModuleEntry, RegistryError>;

    /// All modules in registration order.
    async fn list_modules(&self) -> Vec<ModuleEntry>;

    /// Returns true if the keycode is registered.
    async fn is_registered(&self, keycode: Keycode) -> bool;

    /// Number of registered modules.
    async fn module_count(&self) -> usize;
}
