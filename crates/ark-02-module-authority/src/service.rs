//! # Module Authority Service

use crate::domain::entities::PermissionKey;
use crate::domain::store::AuthorityStore;
use crate::errors::AuthorityError;
use crate::ports::inbound::ModuleAuthorityApi;

use async_trait::async_trait;
use shared_bus::{EventPublisher, KernelEvent, NullPublisher};
use shared_types::entities::{Address, Keycode, RoleId, Selector};
use shared_types::security::{AdminScope, SharedPolicy, SingleAdminPolicy};
use shared_types::unit_of_work::{transact, UnitOfWork};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Module authority configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Roles declared at construction.
    pub initial_roles: Vec<RoleId>,
}

impl ServiceConfig {
    /// Declares roles by name (`keccak256(name)`).
    #[must_use]
    pub fn with_role_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            initial_roles: names
                .into_iter()
                .map(|n| RoleId::of_name(n.as_ref()))
                .collect(),
        }
    }
}

/// Statistics for the authority service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Committed permission grants (including re-grants).
    pub permission_grants: u64,
    /// Committed permission revocations.
    pub permission_revocations: u64,
    /// Committed role changes of any kind.
    pub role_changes: u64,
    /// Calls rejected for any reason.
    pub rejected_calls: u64,
}

type Uow = UnitOfWork<AuthorityStore, KernelEvent>;

/// The module authority service.
pub struct ModuleAuthorityService {
    store: RwLock<AuthorityStore>,
    policy: SharedPolicy,
    publisher: Arc<dyn EventPublisher>,
    stats: RwLock<ServiceStats>,
}

impl ModuleAuthorityService {
    /// Create a service with the configured roles declared.
    pub fn new(
        config: ServiceConfig,
        policy: SharedPolicy,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store: RwLock::new(AuthorityStore::with_roles(config.initial_roles)),
            policy,
            publisher,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    async fn reject(&self, op: &'static str, err: AuthorityError) -> AuthorityError {
        warn!(op, error = %err, "Authority call rejected");
        self.stats.write().await.rejected_calls += 1;
        err
    }

    /// Authorize `caller`, run `f` as one unit of work, publish on commit.
    async fn commit<T, F>(&self, caller: Address, op: &'static str, f: F) -> Result<T, AuthorityError>
    where
        F: FnOnce(&mut Uow) -> Result<T, AuthorityError>,
    {
        if !self.policy.is_authorized(&caller, AdminScope::Authority) {
            return Err(self.reject(op, AuthorityError::Unauthorized { caller }).await);
        }

        let mut store = self.store.write().await;
        match transact(&mut *store, f) {
            Ok((value, events)) => {
                self.publisher.publish_all(events).await;
                drop(store);
                {
                    let mut stats = self.stats.write().await;
                    match op {
                        "grant_permission" => stats.permission_grants += 1,
                        "revoke_permission" => stats.permission_revocations += 1,
                        _ => stats.role_changes += 1,
                    }
                }
                info!(op, "Authority change committed");
                Ok(value)
            }
            Err(err) => {
                drop(store);
                Err(self.reject(op, err).await)
            }
        }
    }
}

#[async_trait]
impl ModuleAuthorityApi for ModuleAuthorityService {
    #[instrument(skip(self), fields(caller = %caller, module = %module, account = %account))]
    async fn grant_permission(
        &self,
        caller: Address,
        module: Keycode,
        account: Address,
        selector: Selector,
    ) -> Result<(), AuthorityError> {
        self.commit(caller, "grant_permission", |uow| {
            uow.state_mut()
                .grant_permission(module, account, selector)?;
            uow.emit(KernelEvent::PermissionGranted {
                module,
                account,
                selector,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, module = %module, account = %account))]
    async fn revoke_permission(
        &self,
        caller: Address,
        module: Keycode,
        account: Address,
        selector: Selector,
    ) -> Result<(), AuthorityError> {
        self.commit(caller, "revoke_permission", |uow| {
            uow.state_mut().revoke_permission(module, account, selector);
            uow.emit(KernelEvent::PermissionRevoked {
                module,
                account,
                selector,
            });
            Ok(())
        })
        .await
    }

    async fn check_permission(&self, module: Keycode, account: Address, selector: Selector) -> bool {
        self.store
            .read()
            .await
            .check_permission(&module, &account, &selector)
    }

    async fn permissions_for(&self, account: Address) -> Vec<PermissionKey> {
        self.store.read().await.permissions_for(&account)
    }

    #[instrument(skip(self), fields(caller = %caller, role = %role))]
    async fn create_role(&self, caller: Address, role: RoleId) -> Result<(), AuthorityError> {
        self.commit(caller, "create_role", |uow| {
            uow.state_mut().create_role(role)?;
            uow.emit(KernelEvent::RoleCreated { role });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, role = %role))]
    async fn remove_role(&self, caller: Address, role: RoleId) -> Result<(), AuthorityError> {
        self.commit(caller, "remove_role", |uow| {
            let former = uow.state_mut().remove_role(role)?;
            for account in former {
                uow.emit(KernelEvent::RoleRevoked { role, account });
            }
            uow.emit(KernelEvent::RoleRemoved { role });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, role = %role, account = %account))]
    async fn grant_role(&self, caller: Address, role: RoleId, account: Address) -> Result<(), AuthorityError> {
        self.commit(caller, "grant_role", |uow| {
            uow.state_mut().grant_role(role, account)?;
            uow.emit(KernelEvent::RoleGranted { role, account });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, role = %role, account = %account))]
    async fn revoke_role(&self, caller: Address, role: RoleId, account: Address) -> Result<(), AuthorityError> {
        self.commit(caller, "revoke_role", |uow| {
            uow.state_mut().revoke_role(role, account)?;
            uow.emit(KernelEvent::RoleRevoked { role, account });
            Ok(())
        })
        .await
    }

    async fn has_role(&self, role: RoleId, account: Address) -> bool {
        self.store.read().await.has_role(&role, &account)
    }

    async fn get_roles(&self, account: Address) -> Vec<RoleId> {
        self.store.read().await.roles_of(&account)
    }

    async fn role_exists(&self, role: RoleId) -> bool {
        self.store.read().await.role_exists(&role)
    }

    async fn role_members(&self, role: RoleId) -> Result<Vec<Address>, AuthorityError> {
        self.store
            .read()
            .await
            .role_members(&role)
            .map(<[Address]>::to_vec)
            .ok_or(AuthorityError::InvalidRole(role))
    }
}

/// Build a standalone service admitting only `admin`, with no event output.
#[must_use]
pub fn create_test_service(admin: Address) -> ModuleAuthorityService {
    ModuleAuthorityService::new(
        ServiceConfig::default(),
        Arc::new(SingleAdminPolicy::new(admin)),
        Arc::new(NullPublisher),
    )
}
