//! # Driving Ports (API - Inbound)

use crate::domain::entities::PermissionKey;
use crate::errors::AuthorityError;
use async_trait::async_trait;
use shared_types::entities::{Address, Keycode, RoleId, Selector};

/// Primary API for permissions and roles.
///
/// Every mutation is admin-only and emits one event per call, including
/// idempotent re-grants and re-revokes.
#[async_trait]
pub trait ModuleAuthorityApi: Send + Sync {
    /// Allow `account` to call `selector` on `module`.
    async fn grant_permission(
        &self,
        caller: Address,
        module: Keycode,
        account: Address,
        selector: Selector,
    ) -> Result<(), AuthorityError>;

    /// Clear a permission.
    async fn revoke_permission(
        &self,
        caller: Address,
        module: Keycode,
        account: Address,
        selector: Selector,
    ) -> Result<(), AuthorityError>;

    /// Returns true if the permission bit is set.
    async fn check_permission(&self, module: Keycode, account: Address, selector: Selector) -> bool;

    /// Every permission held by `account`, sorted.
    async fn permissions_for(&self, account: Address) -> Vec<PermissionKey>;

    /// Declare a role.
    async fn create_role(&self, caller: Address, role: RoleId) -> Result<(), AuthorityError>;

    /// Drop a role and all its assignments.
    async fn remove_role(&self, caller: Address, role: RoleId) -> Result<(), AuthorityError>;

    /// Assign a declared role.
    async fn grant_role(&self, caller: Address, role: RoleId, account: Address) -> Result<(), AuthorityError>;

    /// Remove a role assignment.
    async fn revoke_role(&self, caller: Address, role: RoleId, account: Address) -> Result<(), AuthorityError>;

    /// Returns true if `account` holds `role`.
    async fn has_role(&self, role: RoleId, account: Address) -> bool;

    /// Roles held by `account`, in declaration order.
    async fn get_roles(&self, account: Address) -> Vec<RoleId>;

    /// Returns true if the role is declared.
    async fn role_exists(&self, role: RoleId) -> bool;

    /// Members of a declared role, in grant order.
    async fn role_members(&self, role: RoleId) -> Result<Vec<Address>, AuthorityError>;
}
