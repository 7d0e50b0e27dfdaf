//! # Authority Entities

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, Keycode, Selector};

/// A (module, account, selector) permission tuple.
///
/// Ordered by account first so per-account listings come out grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    pub account: Address,
    pub module: Keycode,
    pub selector: Selector,
}

impl PermissionKey {
    /// Builds a key from the call-order arguments.
    #[must_use]
    pub fn new(module: Keycode, account: Address, selector: Selector) -> Self {
        Self {
            account,
            module,
            selector,
        }
    }
}
