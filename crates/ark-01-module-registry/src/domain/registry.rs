//! # Module Registry Store
//!
//! Maps keycodes to implementation entries and keeps registration order.

use crate::domain::entities::{ModuleEntry, RegistryOp};
use crate::errors::RegistryError;
use shared_bus::KernelEvent;
use shared_types::entities::{Address, Keycode, Timestamp};
use std::collections::HashMap;

/// The registry store.
///
/// Cloned wholesale by a unit of work, so it holds plain owned data only.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<Keycode, ModuleEntry>,
    order: Vec<Keycode>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new module at version 1.
    ///
    /// # Errors
    ///
    /// `ZeroAddress` for a null implementation, `AlreadyRegistered` if the
    /// keycode is taken.
    pub fn register(
        &mut self,
        keycode: Keycode,
        implementation: Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if implementation.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if self.modules.contains_key(&keycode) {
            return Err(RegistryError::AlreadyRegistered(keycode));
        }

        self.modules
            .insert(keycode, ModuleEntry::new(keycode, implementation, now));
        self.order.push(keycode);
        Ok(())
    }

    /// Replaces the implementation of a registered module.
    ///
    /// Returns the previous implementation and the new version.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if absent, `ZeroAddress` for a null implementation.
    pub fn upgrade(
        &mut self,
        keycode: Keycode,
        implementation: Address,
        now: Timestamp,
    ) -> Result<(Address, u32), RegistryError> {
        let entry = self
            .modules
            .get_mut(&keycode)
            .ok_or(RegistryError::NotRegistered(keycode))?;
        if implementation.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }

        let previous = std::mem::replace(&mut entry.implementation, implementation);
        entry.version = entry.version.saturating_add(1);
        entry.upgraded_at = Some(now);
        Ok((previous, entry.version))
    }

    /// Appends `dependency` to the dependency list of `keycode`.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if either side is absent, `InvalidParameter` for a
    /// self link, `DependencyAlreadyLinked` for a duplicate.
    pub fn link_dependency(
        &mut self,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError> {
        if !self.modules.contains_key(&dependency) {
            return Err(RegistryError::NotRegistered(dependency));
        }
        let entry = self
            .modules
            .get_mut(&keycode)
            .ok_or(RegistryError::NotRegistered(keycode))?;
        if keycode == dependency {
            return Err(RegistryError::InvalidParameter(format!(
                "module {keycode} cannot depend on itself"
            )));
        }
        if entry.depends_on(&dependency) {
            return Err(RegistryError::DependencyAlreadyLinked {
                keycode,
                dependency,
            });
        }

        entry.dependencies.push(dependency);
        Ok(())
    }

    /// Removes `dependency` from `keycode`, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if `keycode` is absent, `DependencyNotLinked` if the
    /// link does not exist.
    pub fn unlink_dependency(
        &mut self,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError> {
        let entry = self
            .modules
            .get_mut(&keycode)
            .ok_or(RegistryError::NotRegistered(keycode))?;
        let position = entry
            .dependencies
            .iter()
            .position(|d| *d == dependency)
            .ok_or(RegistryError::DependencyNotLinked {
                keycode,
                dependency,
            })?;

        entry.dependencies.remove(position);
        Ok(())
    }

    /// Applies one operation and returns the event describing it.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub fn apply(&mut self, op: &RegistryOp, now: Timestamp) -> Result<KernelEvent, RegistryError> {
        match *op {
            RegistryOp::Register {
                keycode,
                implementation,
            } => {
                self.register(keycode, implementation, now)?;
                Ok(KernelEvent::ModuleRegistered {
                    keycode,
                    implementation,
                })
            }
            RegistryOp::Upgrade {
                keycode,
                implementation,
            } => {
                let (previous, version) = self.upgrade(keycode, implementation, now)?;
                Ok(KernelEvent::ModuleUpgraded {
                    keycode,
                    previous,
                    implementation,
                    version,
                })
            }
            RegistryOp::LinkDependency {
                keycode,
                dependency,
            } => {
                self.link_dependency(keycode, dependency)?;
                Ok(KernelEvent::DependencyRegistered {
                    keycode,
                    dependency,
                })
            }
            RegistryOp::UnlinkDependency {
                keycode,
                dependency,
            } => {
                self.unlink_dependency(keycode, dependency)?;
                Ok(KernelEvent::DependencyRemoved {
                    keycode,
                    dependency,
                })
            }
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Full entry for a module.
    #[must_use]
    pub fn get(&self, keycode: &Keycode) -> Option<&ModuleEntry> {
        self.modules.get(keycode)
    }

    /// Current implementation of a module.
    #[must_use]
    pub fn implementation(&self, keycode: &Keycode) -> Option<Address> {
        self.modules.get(keycode).map(|e| e.implementation)
    }

    /// Dependencies of a module in link order.
    #[must_use]
    pub fn dependencies(&self, keycode: &Keycode) -> Option<&[Keycode]> {
        self.modules.get(keycode).map(|e| e.dependencies.as_slice())
    }

    /// Returns true if the keycode is registered.
    #[must_use]
    pub fn contains(&self, keycode: &Keycode) -> bool {
        self.modules.contains_key(keycode)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.order.iter().filter_map(|k| self.modules.get(k))
    }

    /// Registration order of keycodes.
    #[must_use]
    pub fn order(&self) -> &[Keycode] {
        &self.order
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
