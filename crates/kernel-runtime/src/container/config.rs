//! # Kernel Configuration
//!
//! Unified configuration for the subsystems and the runtime.
//!
//! ## Security Requirements
//!
//! - At least one admin address MUST be configured; the default has none
//! - The zero address is never accepted as an admin

use ark_telemetry::TelemetryConfig;
use shared_types::entities::{Address, RoleId};
use shared_types::security::AdminScope;
use std::collections::HashMap;
use thiserror::Error;

/// Complete kernel configuration.
#[derive(Debug, Clone, Default)]
pub struct KernelConfig {
    /// Who administers the kernel.
    pub admin: AdminConfig,
    /// System queue settings.
    pub queue: QueueConfig,
    /// Roles declared at startup.
    pub roles: RolesConfig,
    /// Event bus settings.
    pub bus: BusConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no admin address configured; set ARK_ADMIN")]
    NoAdmin,

    #[error("the zero address cannot be an admin")]
    ZeroAdmin,

    #[error("the zero address cannot own the system queue")]
    ZeroQueueOwner,

    #[error("single-admin policy needs exactly one admin, got {0}")]
    AmbiguousAdmin(usize),

    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("invalid value for {key}: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("unknown policy {0:?}; expected single, set or scoped")]
    UnknownPolicy(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which [`AuthorizationPolicy`](shared_types::security::AuthorizationPolicy)
/// the runtime builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// One admin for everything.
    #[default]
    Single,
    /// Any configured admin, every scope.
    AdminSet,
    /// Per-scope admin sets, falling back to the admin list.
    Scoped,
}

impl std::str::FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "set" | "admin-set" => Ok(Self::AdminSet),
            "scoped" => Ok(Self::Scoped),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Admin configuration.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    pub admins: Vec<Address>,
    pub policy: PolicyKind,
    /// Scope overrides, only read by [`PolicyKind::Scoped`].
    pub scoped: HashMap<AdminScope, Vec<Address>>,
}

/// System queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Owner of queue 0. Defaults to the first admin.
    pub system_owner: Option<Address>,
    pub system_queue_size: usize,
    pub processing_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            system_owner: None,
            system_queue_size: 1_000,
            processing_timeout_ms: 30_000,
        }
    }
}

/// Roles declared at startup, by name.
#[derive(Debug, Clone, Default)]
pub struct RolesConfig {
    pub initial_roles: Vec<String>,
}

impl RolesConfig {
    /// Role ids (`keccak256(name)`).
    #[must_use]
    pub fn role_ids(&self) -> Vec<RoleId> {
        self.initial_roles
            .iter()
            .map(|name| RoleId::of_name(name))
            .collect()
    }
}

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Broadcast channel capacity.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Parses a `0x`-prefixed or bare 40-digit hex address.
///
/// # Errors
///
/// `InvalidAddress` for bad hex or a wrong length.
pub fn parse_address(value: &str) -> Result<Address, ConfigError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| ConfigError::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    let array: [u8; 20] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| ConfigError::InvalidAddress {
            value: value.to_string(),
            reason: format!("expected 20 bytes, got {}", b.len()),
        })?;
    Ok(Address::new(array))
}

fn parse_address_list(value: &str) -> Result<Vec<Address>, ConfigError> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_address)
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

const SCOPE_VARS: [(AdminScope, &str); 4] = [
    (AdminScope::Registry, "ARK_ADMIN_REGISTRY"),
    (AdminScope::Authority, "ARK_ADMIN_AUTHORITY"),
    (AdminScope::Validator, "ARK_ADMIN_VALIDATOR"),
    (AdminScope::EventTypes, "ARK_ADMIN_EVENT_TYPES"),
];

impl KernelConfig {
    /// A valid configuration with a single admin.
    #[must_use]
    pub fn for_admin(admin: Address) -> Self {
        Self {
            admin: AdminConfig {
                admins: vec![admin],
                ..AdminConfig::default()
            },
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ARK_ADMIN`: comma separated admin addresses
    /// - `ARK_POLICY`: `single` (default), `set` or `scoped`
    /// - `ARK_ADMIN_REGISTRY` / `_AUTHORITY` / `_VALIDATOR` / `_EVENT_TYPES`:
    ///   scope overrides for the scoped policy
    /// - `ARK_SYSTEM_QUEUE_OWNER`, `ARK_SYSTEM_QUEUE_SIZE`,
    ///   `ARK_PROCESSING_TIMEOUT_MS`
    /// - `ARK_INITIAL_ROLES`: comma separated role names
    /// - `ARK_BUS_CAPACITY`
    /// - Telemetry variables, see [`TelemetryConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Any variable that is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Build configuration from a key lookup. Telemetry stays at its default.
    ///
    /// # Errors
    ///
    /// Any key that is present but does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("ARK_ADMIN") {
            config.admin.admins = parse_address_list(&value)?;
        }
        if let Some(value) = lookup("ARK_POLICY") {
            config.admin.policy = value.parse()?;
        }
        for (scope, key) in SCOPE_VARS {
            if let Some(value) = lookup(key) {
                config.admin.scoped.insert(scope, parse_address_list(&value)?);
            }
        }

        if let Some(value) = lookup("ARK_SYSTEM_QUEUE_OWNER") {
            config.queue.system_owner = Some(parse_address(&value)?);
        }
        if let Some(value) = lookup("ARK_SYSTEM_QUEUE_SIZE") {
            config.queue.system_queue_size = parse_number("ARK_SYSTEM_QUEUE_SIZE", &value)?;
        }
        if let Some(value) = lookup("ARK_PROCESSING_TIMEOUT_MS") {
            config.queue.processing_timeout_ms = parse_number("ARK_PROCESSING_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = lookup("ARK_INITIAL_ROLES") {
            config.roles.initial_roles = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup("ARK_BUS_CAPACITY") {
            config.bus.capacity = parse_number("ARK_BUS_CAPACITY", &value)?;
        }

        Ok(config)
    }

    /// Validate configuration before bootstrapping.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - no admin is configured, or one is the zero address
    /// - the single-admin policy is given more than one admin
    /// - the system queue owner is the zero address
    /// - the system queue size or bus capacity is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let admins = &self.admin.admins;
        if admins.is_empty() {
            return Err(ConfigError::NoAdmin);
        }
        let scoped = self.admin.scoped.values().flatten();
        if admins.iter().chain(scoped).any(Address::is_zero) {
            return Err(ConfigError::ZeroAdmin);
        }
        if self.admin.policy == PolicyKind::Single && admins.len() != 1 {
            return Err(ConfigError::AmbiguousAdmin(admins.len()));
        }
        if self.queue.system_owner.is_some_and(|owner| owner.is_zero()) {
            return Err(ConfigError::ZeroQueueOwner);
        }
        if self.queue.system_queue_size == 0 {
            return Err(ConfigError::Invalid("system queue size must be at least 1".to_string()));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::Invalid("bus capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// First configured admin, or the zero address before validation.
    #[must_use]
    pub fn primary_admin(&self) -> Address {
        self.admin.admins.first().copied().unwrap_or(Address::ZERO)
    }

    /// Owner of the system queue.
    #[must_use]
    pub fn system_queue_owner(&self) -> Address {
        self.queue.system_owner.unwrap_or_else(|| self.primary_admin())
    }
}
