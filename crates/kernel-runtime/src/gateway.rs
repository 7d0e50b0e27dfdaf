//! # Kernel Gateway
//!
//! The call path every module invocation takes:
//!
//! ```text
//! authorize_call(caller, module, selector)
//!     │
//!     ├─► Registry.get_implementation(module)        NotRegistered ──► reject
//!     ├─► Authority.check_permission(module, caller, selector)
//!     │                                               false ──► PermissionDenied
//!     ├─► Validator.validate_access(caller, module, selector)
//!     │                                               false ──► AccessRejected
//!     └─► implementation address
//! ```
//!
//! The gateway never mutates registry or authority state. The validator
//! counts every call that reaches it.

use ark_01_module_registry::{ModuleRegistryApi, RegistryError};
use ark_02_module_authority::ModuleAuthorityApi;
use ark_03_access_validator::AccessValidatorApi;
use ark_telemetry::{record_error, time_histogram, GATEWAY_CALLS, GATEWAY_DURATION};
use shared_types::entities::{Address, Keycode, Selector};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a call was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Module resolution failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The permission bit is not set.
    #[error("{account} may not call {selector} on {module}")]
    PermissionDenied {
        module: Keycode,
        account: Address,
        selector: Selector,
    },

    /// The access validator refused the call.
    #[error("access validator rejected {account} calling {selector} on {module}")]
    AccessRejected {
        module: Keycode,
        account: Address,
        selector: Selector,
    },
}

impl GatewayError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(err) => err.kind(),
            Self::PermissionDenied { .. } => "permission_denied",
            Self::AccessRejected { .. } => "access_rejected",
        }
    }
}

/// Resolves and authorizes module calls.
#[derive(Clone)]
pub struct KernelGateway {
    registry: Arc<dyn ModuleRegistryApi>,
    authority: Arc<dyn ModuleAuthorityApi>,
    validator: Arc<dyn AccessValidatorApi>,
}

impl KernelGateway {
    pub fn new(
        registry: Arc<dyn ModuleRegistryApi>,
        authority: Arc<dyn ModuleAuthorityApi>,
        validator: Arc<dyn AccessValidatorApi>,
    ) -> Self {
        Self {
            registry,
            authority,
            validator,
        }
    }

    /// Resolve `module` and check that `caller` may invoke `selector` on it.
    ///
    /// Returns the implementation address to dispatch to.
    ///
    /// # Errors
    ///
    /// `Registry(NotRegistered)`, `PermissionDenied` or `AccessRejected`.
    #[instrument(skip(self), fields(caller = %caller, module = %module, selector = %selector))]
    pub async fn authorize_call(
        &self,
        caller: Address,
        module: Keycode,
        selector: Selector,
    ) -> Result<Address, GatewayError> {
        let _timer = time_histogram!(GATEWAY_DURATION);

        match self.route(caller, module, selector).await {
            Ok(implementation) => {
                GATEWAY_CALLS.with_label_values(&["routed"]).inc();
                debug!(implementation = %implementation, "Call routed");
                Ok(implementation)
            }
            Err(err) => {
                GATEWAY_CALLS.with_label_values(&[err.kind()]).inc();
                record_error("gateway", err.kind());
                warn!(error = %err, "Call refused");
                Err(err)
            }
        }
    }

    async fn route(&self, caller: Address, module: Keycode, selector: Selector) -> Result<Address, GatewayError> {
        let implementation = self.registry.get_implementation(module).await?;

        if !self
            .authority
            .check_permission(module, caller, selector)
            .await
        {
            return Err(GatewayError::PermissionDenied {
                module,
                account: caller,
                selector,
            });
        }

        if !self
            .validator
            .validate_access(caller, module, selector)
            .await
        {
            return Err(GatewayError::AccessRejected {
                module,
                account: caller,
                selector,
            });
        }

        Ok(implementation)
    }
}
