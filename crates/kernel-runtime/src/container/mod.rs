//! # Kernel Container
//!
//! Configuration plus the container that owns every subsystem instance.

pub mod config;
pub mod kernel;

pub use config::{ConfigError, KernelConfig, PolicyKind};
pub use kernel::{build_policy, KernelContainer};
