//! # Access Validator Service
//!
//! Rule mutations are admin-only units of work. `validate_access` is open to
//! everyone, always permits, and only bumps counters.

use crate::domain::entities::ValidationRule;
use crate::domain::rules::RuleBook;
use crate::errors::ValidatorError;
use crate::ports::inbound::AccessValidatorApi;

use async_trait::async_trait;
use shared_bus::{EventPublisher, KernelEvent, NullPublisher};
use shared_types::entities::{Address, Keycode, RuleId, Selector};
use shared_types::security::{AdminScope, SharedPolicy, SingleAdminPolicy};
use shared_types::unit_of_work::{transact, UnitOfWork};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// The access validator service.
pub struct AccessValidatorService {
    store: RwLock<RuleBook>,
    policy: SharedPolicy,
    publisher: Arc<dyn EventPublisher>,
}

impl AccessValidatorService {
    /// Create a service with no rules and zeroed counters.
    pub fn new(policy: SharedPolicy, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store: RwLock::new(RuleBook::new()),
            policy,
            publisher,
        }
    }

    async fn commit<F>(&self, caller: Address, op: &'static str, f: F) -> Result<(), ValidatorError>
    where
        F: FnOnce(&mut UnitOfWork<RuleBook, KernelEvent>) -> Result<(), ValidatorError>,
    {
        if !self.policy.is_authorized(&caller, AdminScope::Validator) {
            let err = ValidatorError::Unauthorized { caller };
            warn!(op, error = %err, "Validator call rejected");
            return Err(err);
        }

        let mut store = self.store.write().await;
        match transact(&mut *store, f) {
            Ok(((), events)) => {
                self.publisher.publish_all(events).await;
                info!(op, "Validation rules changed");
                Ok(())
            }
            Err(err) => {
                warn!(op, error = %err, "Validator call rejected");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl AccessValidatorApi for AccessValidatorService {
    #[instrument(skip(self), fields(caller = %caller, module = %module))]
    async fn add_rule(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        priority: u32,
    ) -> Result<(), ValidatorError> {
        self.commit(caller, "add_rule", |uow| {
            uow.state_mut()
                .add_rule(module, selector, rule_id, priority)?;
            uow.emit(KernelEvent::RuleAdded {
                module,
                selector,
                rule_id,
                priority,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, module = %module))]
    async fn set_rule_active(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        active: bool,
    ) -> Result<(), ValidatorError> {
        self.commit(caller, "set_rule_active", |uow| {
            uow.state_mut()
                .set_rule_active(module, selector, rule_id, active)?;
            uow.emit(KernelEvent::RuleStatusChanged {
                module,
                selector,
                rule_id,
                active,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, module = %module))]
    async fn remove_rule(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    ) -> Result<(), ValidatorError> {
        self.commit(caller, "remove_rule", |uow| {
            uow.state_mut().remove_rule(module, selector, rule_id)?;
            uow.emit(KernelEvent::RuleRemoved {
                module,
                selector,
                rule_id,
            });
            Ok(())
        })
        .await
    }

    async fn get_rules(&self, module: Keycode, selector: Selector) -> Vec<ValidationRule> {
        self.store.read().await.rules(&module, &selector).to_vec()
    }

    async fn validate_access(&self, account: Address, module: Keycode, selector: Selector) -> bool {
        // Stored rules are not evaluated.
        let mut store = self.store.write().await;
        let total = store.record_validation(module, selector);
        debug!(account = %account, module = %module, selector = %selector, total, "Access validated");
        self.publisher
            .publish(KernelEvent::AccessValidated {
                account,
                module,
                selector,
                total,
            })
            .await;
        true
    }

    async fn validation_count(&self) -> u64 {
        self.store.read().await.total_validations()
    }

    async fn validation_count_for(&self, module: Keycode, selector: Selector) -> u64 {
        self.store.read().await.validations_for(&module, &selector)
    }
}

/// Build a standalone service admitting only `admin`, with no event output.
#[must_use]
pub fn create_test_service(admin: Address) -> AccessValidatorService {
    AccessValidatorService::new(Arc::new(SingleAdminPolicy::new(admin)), Arc::new(NullPublisher))
}
