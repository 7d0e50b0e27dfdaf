//! # Core Identifiers
//!
//! Fixed-size opaque keys used by every kernel subsystem.
//!
//! ## Clusters
//!
//! - **Modules**: `Keycode`, `Selector`
//! - **Accounts**: `Address`
//! - **Hashed names**: `Hash32` and its aliases `RoleId`, `RuleId`, `EventTypeId`
//! - **Counters**: `QueueId`, `EventId`, `Timestamp`
//!
//! None of these types carry internal structure beyond equality; the
//! constructors only exist so callers can build keys from labels and
//! signatures the same way the on-chain contracts did.

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Identifier of an event queue. Queue 0 is the reserved system queue.
pub type QueueId = u64;

/// Per-queue monotonically increasing event identifier.
pub type EventId = u64;

/// Computes Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn parse_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], IdentifierError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| IdentifierError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(IdentifierError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account or implementation address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address whose final two bytes hold `value`.
    ///
    /// Handy for fixtures: `Address::from_low_u16(0x1111)`.
    #[must_use]
    pub const fn from_low_u16(value: u16) -> Self {
        let mut bytes = [0u8; 20];
        let be = value.to_be_bytes();
        bytes[18] = be[0];
        bytes[19] = be[1];
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the null address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_fixed::<20>(s).map(Self)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// KEYCODE (32 bytes)
// =============================================================================

/// Opaque 32-byte module identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Keycode(pub [u8; 32]);

impl Keycode {
    /// Creates a keycode from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a keycode from a short ASCII label, left-aligned and zero padded.
    ///
    /// # Errors
    ///
    /// Fails if the label is empty, longer than 32 bytes, or not ASCII.
    pub fn from_label(label: &str) -> Result<Self, IdentifierError> {
        if label.is_empty() || !label.is_ascii() {
            return Err(IdentifierError::InvalidLabel(label.to_string()));
        }
        if label.len() > 32 {
            return Err(IdentifierError::InvalidLength {
                expected: 32,
                actual: label.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes[..label.len()].copy_from_slice(label.as_bytes());
        Ok(Self(bytes))
    }

    /// Creates a keycode whose first byte is `value` and the rest zero.
    #[must_use]
    pub const fn from_leading_byte(value: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = value;
        Self(bytes)
    }

    /// Creates a keycode from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the printable label if the keycode was built from one.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(32);
        if end == 0 || self.0[end..].iter().any(|b| *b != 0) {
            return None;
        }
        std::str::from_utf8(&self.0[..end])
            .ok()
            .filter(|s| s.chars().all(|c| c.is_ascii_graphic()))
    }
}

impl fmt::Debug for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "Keycode({label})"),
            None => write!(f, "Keycode(0x{})", hex::encode(self.0)),
        }
    }
}

impl fmt::Display for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "0x{}", hex::encode(&self.0[..4])),
        }
    }
}

impl FromStr for Keycode {
    type Err = IdentifierError;

    /// Parses `0x`-prefixed hex, otherwise treats the input as a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            parse_hex_fixed::<32>(s).map(Self)
        } else {
            Self::from_label(s)
        }
    }
}

// =============================================================================
// SELECTOR (4 bytes)
// =============================================================================

/// A 4-byte function selector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Creates a selector from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Creates a selector from its big-endian `u32` form, e.g. `0xdeadbeef`.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// First four bytes of `keccak256(signature)`.
    ///
    /// `Selector::from_signature("transfer(address,uint256)")` yields `0xa9059cbb`.
    #[must_use]
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Selector {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_fixed::<4>(s).map(Self)
    }
}

// =============================================================================
// HASH32 (32 bytes)
// =============================================================================

/// A 32-byte hash naming a role, rule or event type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash32(pub [u8; 32]);

/// Role identifier, `keccak256(role_name)`.
pub type RoleId = Hash32;

/// Validation rule identifier.
pub type RuleId = Hash32;

/// Event type identifier, `keccak256(event_type_name)`.
pub type EventTypeId = Hash32;

impl Hash32 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Keccak-256 of arbitrary bytes.
    #[must_use]
    pub fn keccak(data: &[u8]) -> Self {
        Self(keccak256(data))
    }

    /// Keccak-256 of a UTF-8 name. Used for role and event-type ids.
    #[must_use]
    pub fn of_name(name: &str) -> Self {
        Self::keccak(name.as_bytes())
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..{}", hex::encode(&self.0[..4]), hex::encode(&self.0[30..]))
    }
}

impl FromStr for Hash32 {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_fixed::<32>(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_from_signature() {
        let selector = Selector::from_signature("transfer(address,uint256)");
        assert_eq!(selector, Selector::from_u32(0xa905_9cbb));
    }

    #[test]
    fn test_keycode_label_roundtrip() {
        let code = Keycode::from_label("TRSRY").unwrap();
        assert_eq!(code.label(), Some("TRSRY"));
        assert_eq!(code.to_string(), "TRSRY");
        assert_eq!("TRSRY".parse::<Keycode>().unwrap(), code);
    }

    #[test]
    fn test_keycode_rejects_bad_labels() {
        assert!(Keycode::from_label("").is_err());
        assert!(Keycode::from_label(&"A".repeat(33)).is_err());
        assert!(Keycode::from_label("µ").is_err());
    }

    #[test]
    fn test_keycode_without_label() {
        let code = Keycode::from_leading_byte(0xA1);
        assert_eq!(code.label(), None);
        assert_eq!(code.to_string(), "0xa1000000");
    }

    #[test]
    fn test_address_parse() {
        let addr: Address = "0x0000000000000000000000000000000000001111".parse().unwrap();
        assert_eq!(addr, Address::from_low_u16(0x1111));
        assert!(!addr.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_parse_wrong_length() {
        let err = "0x1111".parse::<Address>().unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::InvalidLength {
                expected: 20,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_hash_of_name_is_keccak() {
        let role = Hash32::of_name("EXECUTOR");
        assert_eq!(role, Hash32::keccak(b"EXECUTOR"));
        assert_ne!(role, Hash32::of_name("GUARDIAN"));
    }

    #[test]
    fn test_selector_parse() {
        let selector: Selector = "0xdeadbeef".parse().unwrap();
        assert_eq!(selector, Selector::from_u32(0xdead_beef));
    }

    proptest::proptest! {
        #[test]
        fn prop_keycode_label_roundtrip(label in "[A-Z0-9_]{1,32}") {
            let code = Keycode::from_label(&label).unwrap();
            proptest::prop_assert_eq!(code.label(), Some(label.as_str()));
        }

        #[test]
        fn prop_address_display_parses_back(bytes in proptest::array::uniform20(proptest::prelude::any::<u8>())) {
            let addr = Address::new(bytes);
            proptest::prop_assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
        }
    }
}
