//! # Module Registry Service
//!
//! Async facade over the registry store. Every mutation:
//!
//! 1. asks the injected policy whether the caller may act on the registry,
//! 2. applies its operations to a unit of work under the write lock,
//! 3. commits and publishes the collected events before releasing the lock.
//!
//! A rejected call changes nothing and publishes nothing.

use crate::domain::entities::{ModuleEntry, RegistryOp};
use crate::domain::registry::ModuleRegistry;
use crate::errors::RegistryError;
use crate::ports::inbound::ModuleRegistryApi;

use async_trait::async_trait;
use shared_bus::{EventPublisher, KernelEvent, NullPublisher};
use shared_types::entities::{Address, Keycode};
use shared_types::security::{AdminScope, SharedPolicy, SingleAdminPolicy};
use shared_types::time::{SystemTimeSource, TimeSource};
use shared_types::unit_of_work::{transact, UnitOfWork};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Statistics for the registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Operations committed (a batch counts each of its operations).
    pub operations_committed: u64,
    /// Batches committed through `execute_batch`.
    pub batches_committed: u64,
    /// Calls rejected for any reason.
    pub rejected_calls: u64,
}

/// The module registry service.
pub struct ModuleRegistryService {
    store: RwLock<ModuleRegistry>,
    policy: SharedPolicy,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    stats: RwLock<ServiceStats>,
}

impl ModuleRegistryService {
    /// Create a service over an empty registry.
    pub fn new(
        policy: SharedPolicy,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store: RwLock::new(ModuleRegistry::new()),
            policy,
            publisher,
            clock,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Snapshot of the committed store.
    pub async fn snapshot(&self) -> ModuleRegistry {
        self.store.read().await.clone()
    }

    async fn reject(&self, op: &'static str, err: RegistryError) -> RegistryError {
        warn!(op, error = %err, "Registry call rejected");
        self.stats.write().await.rejected_calls += 1;
        err
    }

    /// Authorize, apply `ops` atomically, publish on success.
    async fn commit(
        &self,
        caller: Address,
        label: &'static str,
        ops: Vec<RegistryOp>,
    ) -> Result<usize, RegistryError> {
        if !self.policy.is_authorized(&caller, AdminScope::Registry) {
            return Err(self
                .reject(label, RegistryError::Unauthorized { caller })
                .await);
        }

        let now = self.clock.now();
        let mut store = self.store.write().await;
        let result = transact(
            &mut *store,
            |uow: &mut UnitOfWork<ModuleRegistry, KernelEvent>| {
                for op in &ops {
                    let event = uow.state_mut().apply(op, now)?;
                    uow.emit(event);
                }
                Ok::<_, RegistryError>(ops.len())
            },
        );

        let (applied, events) = match result {
            Ok(committed) => committed,
            Err(err) => {
                drop(store);
                return Err(self.reject(label, err).await);
            }
        };

        // Published under the write guard so bus order is commit order.
        self.publisher.publish_all(events).await;
        drop(store);

        {
            let mut stats = self.stats.write().await;
            stats.operations_committed += applied as u64;
            if label == "execute_batch" {
                stats.batches_committed += 1;
            }
        }

        info!(op = label, applied, "Registry change committed");
        Ok(applied)
    }
}

#[async_trait]
impl ModuleRegistryApi for ModuleRegistryService {
    #[instrument(skip(self), fields(caller = %caller, keycode = %keycode))]
    async fn register(
        &self,
        caller: Address,
        keycode: Keycode,
        implementation: Address,
    ) -> Result<(), RegistryError> {
        let op = RegistryOp::Register {
            keycode,
            implementation,
        };
        self.commit(caller, op.name(), vec![op]).await.map(|_| ())
    }

    #[instrument(skip(self), fields(caller = %caller, keycode = %keycode))]
    async fn upgrade(
        &self,
        caller: Address,
        keycode: Keycode,
        implementation: Address,
    ) -> Result<(), RegistryError> {
        let op = RegistryOp::Upgrade {
            keycode,
            implementation,
        };
        self.commit(caller, op.name(), vec![op]).await.map(|_| ())
    }

    #[instrument(skip(self), fields(caller = %caller, keycode = %keycode))]
    async fn register_dependency(
        &self,
        caller: Address,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError> {
        let op = RegistryOp::LinkDependency {
            keycode,
            dependency,
        };
        self.commit(caller, op.name(), vec![op]).await.map(|_| ())
    }

    #[instrument(skip(self), fields(caller = %caller, keycode = %keycode))]
    async fn remove_dependency(
        &self,
        caller: Address,
        keycode: Keycode,
        dependency: Keycode,
    ) -> Result<(), RegistryError> {
        let op = RegistryOp::UnlinkDependency {
            keycode,
            dependency,
        };
        self.commit(caller, op.name(), vec![op]).await.map(|_| ())
    }

    #[instrument(skip(self, ops), fields(caller = %caller, ops = ops.len()))]
    async fn execute_batch(
        &self,
        caller: Address,
        ops: Vec<RegistryOp>,
    ) -> Result<usize, RegistryError> {
        if ops.is_empty() {
            return Err(self
                .reject(
                    "execute_batch",
                    RegistryError::InvalidParameter("empty batch".to_string()),
                )
                .await);
        }
        self.commit(caller, "execute_batch", ops).await
    }

    async fn get_implementation(&self, keycode: Keycode) -> Result<Address, RegistryError> {
        let implementation = self
            .store
            .read()
            .await
            .implementation(&keycode)
            .ok_or(RegistryError::NotRegistered(keycode))?;
        debug!(keycode = %keycode, implementation = %implementation, "Resolved module");
        Ok(implementation)
    }

    async fn get_all_dependencies(&self, keycode: Keycode) -> Result<Vec<Keycode>, RegistryError> {
        self.store
            .read()
            .await
            .dependencies(&keycode)
            .map(<[Keycode]>::to_vec)
            .ok_or(RegistryError::NotRegistered(keycode))
    }

    async fn get_module(&self, keycode: Keycode) -> Result<ModuleEntry, RegistryError> {
        self.store
            .read()
            .await
            .get(&keycode)
            .cloned()
            .ok_or(RegistryError::NotRegistered(keycode))
    }

    async fn list_modules(&self) -> Vec<ModuleEntry> {
        self.store.read().await.iter().cloned().collect()
    }

    async fn is_registered(&self, keycode: Keycode) -> bool {
        self.store.read().await.contains(&keycode)
    }

    async fn module_count(&self) -> usize {
        self.store.read().await.len()
    }
}

/// Build a standalone service admitting only `admin`, with no event output.
#[must_use]
pub fn create_test_service(admin: Address) -> ModuleRegistryService {
    ModuleRegistryService::new(
        Arc::new(SingleAdminPolicy::new(admin)),
        Arc::new(NullPublisher),
        Arc::new(SystemTimeSource),
    )
}
