//! # ARK Kernel Test Suite
//!
//! Cross-subsystem scenarios driven through a bootstrapped
//! [`KernelContainer`](kernel_runtime::KernelContainer) and observed on the
//! shared event bus.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs             # kernel bootstrap with a manual clock
//!     ├── call_path.rs           # registry → authority → validator
//!     ├── observers.rs           # bus ordering and metrics under load
//!     ├── queue_flows.rs         # producers, processors, timeout reclaim
//!     └── subscription_flows.rs  # event types, subscribers, notify
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ark-tests
//! cargo test -p ark-tests integration::queue_flows
//! ```

#![allow(dead_code)]

pub mod integration;
