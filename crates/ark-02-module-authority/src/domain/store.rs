//! # Authority Store
//!
//! Permission facts are a flat set: granted means present. Roles are
//! declared first and then assigned; undeclared roles cannot be assigned.

use crate::domain::entities::PermissionKey;
use crate::errors::AuthorityError;
use shared_types::entities::{Address, Keycode, RoleId, Selector};
use std::collections::{BTreeSet, HashMap};

/// Permission and role state.
#[derive(Debug, Clone, Default)]
pub struct AuthorityStore {
    permissions: BTreeSet<PermissionKey>,
    /// Declared roles in declaration order.
    roles: Vec<RoleId>,
    /// Members per role in grant order.
    members: HashMap<RoleId, Vec<Address>>,
}

impl AuthorityStore {
    /// Creates a store with `initial_roles` declared. Duplicates and the
    /// zero id are skipped.
    pub fn with_roles(initial_roles: impl IntoIterator<Item = RoleId>) -> Self {
        let mut store = Self::default();
        for role in initial_roles {
            // Ignoring the error keeps the first declaration of a duplicate.
            let _ = store.create_role(role);
        }
        store
    }

    // =========================================================================
    // PERMISSIONS
    // =========================================================================

    /// Sets a permission. Returns true if it was not already set.
    ///
    /// # Errors
    ///
    /// `ZeroAddress` for a null account.
    pub fn grant_permission(
        &mut self,
        module: Keycode,
        account: Address,
        selector: Selector,
    ) -> Result<bool, AuthorityError> {
        if account.is_zero() {
            return Err(AuthorityError::ZeroAddress);
        }
        Ok(self
            .permissions
            .insert(PermissionKey::new(module, account, selector)))
    }

    /// Clears a permission. Returns true if it was set.
    pub fn revoke_permission(&mut self, module: Keycode, account: Address, selector: Selector) -> bool {
        self.permissions
            .remove(&PermissionKey::new(module, account, selector))
    }

    /// Returns true if the permission is set.
    #[must_use]
    pub fn check_permission(&self, module: &Keycode, account: &Address, selector: &Selector) -> bool {
        self.permissions
            .contains(&PermissionKey::new(*module, *account, *selector))
    }

    /// Every permission held by `account`, sorted by (module, selector).
    #[must_use]
    pub fn permissions_for(&self, account: &Address) -> Vec<PermissionKey> {
        self.permissions
            .iter()
            .filter(|key| key.account == *account)
            .copied()
            .collect()
    }

    /// Number of set permission bits.
    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    // =========================================================================
    // ROLES
    // =========================================================================

    /// Declares a role.
    ///
    /// # Errors
    ///
    /// `InvalidRole` for the zero id, `RoleAlreadyExists` if declared.
    pub fn create_role(&mut self, role: RoleId) -> Result<(), AuthorityError> {
        if role.is_zero() {
            return Err(AuthorityError::InvalidRole(role));
        }
        if self.role_exists(&role) {
            return Err(AuthorityError::RoleAlreadyExists(role));
        }
        self.roles.push(role);
        self.members.insert(role, Vec::new());
        Ok(())
    }

    /// Drops a role and all its assignments. Returns the former members.
    ///
    /// # Errors
    ///
    /// `InvalidRole` if the role is not declared.
    pub fn remove_role(&mut self, role: RoleId) -> Result<Vec<Address>, AuthorityError> {
        let position = self
            .roles
            .iter()
            .position(|r| *r == role)
            .ok_or(AuthorityError::InvalidRole(role))?;
        self.roles.remove(position);
        Ok(self.members.remove(&role).unwrap_or_default())
    }

    /// Assigns a role. Returns true if the account did not hold it.
    ///
    /// # Errors
    ///
    /// `InvalidRole` if undeclared, `ZeroAddress` for a null account.
    pub fn grant_role(&mut self, role: RoleId, account: Address) -> Result<bool, AuthorityError> {
        if account.is_zero() {
            return Err(AuthorityError::ZeroAddress);
        }
        let members = self
            .members
            .get_mut(&role)
            .ok_or(AuthorityError::InvalidRole(role))?;
        if members.contains(&account) {
            return Ok(false);
        }
        members.push(account);
        Ok(true)
    }

    /// Removes a role assignment. Returns true if the account held it.
    ///
    /// # Errors
    ///
    /// `InvalidRole` if undeclared.
    pub fn revoke_role(&mut self, role: RoleId, account: Address) -> Result<bool, AuthorityError> {
        let members = self
            .members
            .get_mut(&role)
            .ok_or(AuthorityError::InvalidRole(role))?;
        match members.iter().position(|a| *a == account) {
            Some(position) => {
                members.remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns true if `account` holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &RoleId, account: &Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|members| members.contains(account))
    }

    /// Roles held by `account`, in declaration order.
    #[must_use]
    pub fn roles_of(&self, account: &Address) -> Vec<RoleId> {
        self.roles
            .iter()
            .filter(|role| self.has_role(role, account))
            .copied()
            .collect()
    }

    /// Returns true if the role is declared.
    #[must_use]
    pub fn role_exists(&self, role: &RoleId) -> bool {
        self.members.contains_key(role)
    }

    /// Members of a role in grant order, or `None` if undeclared.
    #[must_use]
    pub fn role_members(&self, role: &RoleId) -> Option<&[Address]> {
        self.members.get(role).map(Vec::as_slice)
    }

    /// Declared roles in declaration order.
    #[must_use]
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }
}
