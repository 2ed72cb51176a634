//! # Value Objects
//!
//! Immutable domain primitives for deployment orchestration.
//! These types represent concepts that are defined by their value, not identity.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for base-18 fixed point amounts
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte component or account address.
///
/// Opaque to the orchestrator: it is only produced by the execution primitive
/// and substituted into later calls. Serialized as a `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
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

/// Error returned when parsing an [`Address`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// Not valid hexadecimal.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes).ok_or(AddressParseError::InvalidLength(bytes.len()))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte transaction hash (Keccak-256).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("0x{}", hex::encode(self.0)))
    }
}

// =============================================================================
// COMPONENT ID
// =============================================================================

/// Identity of a component inside one deployment plan (e.g. `"ledger"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Creates a component id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// LIMIT CONFIG
// =============================================================================

/// Transfer limits applied by the rate-limiting policy engine.
///
/// Amounts are in the smallest unit (base-18 fixed point). Pure data, passed
/// by value into a configuration step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum amount per single transfer.
    #[serde(with = "decimal_u256")]
    pub max_transfer_amount: U256,
    /// Minimum seconds between two transfers from the same account.
    pub cooldown_period_secs: u64,
    /// Maximum cumulative amount per period.
    #[serde(with = "decimal_u256")]
    pub period_limit: U256,
    /// Period length in seconds.
    pub period_duration_secs: u64,
}

impl LimitConfig {
    /// Encodes the config as the 4-tuple the limiter expects, in field order.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Tuple(vec![
            Value::Uint(self.max_transfer_amount),
            Value::Uint(U256::from(self.cooldown_period_secs)),
            Value::Uint(self.period_limit),
            Value::Uint(U256::from(self.period_duration_secs)),
        ])
    }
}

// =============================================================================
// ARGUMENTS & VALUES
// =============================================================================

/// A constructor parameter or call argument as written in a plan.
///
/// Either a literal or a reference to another component's resolved address.
/// In plan files this is an externally tagged table such as
/// `{ ref = "ledger" }` or `{ uint = "1000000" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// Address of a component provisioned earlier in the plan.
    Ref(ComponentId),
    /// Literal address.
    Address(Address),
    /// Literal unsigned integer (decimal string in plan files).
    Uint(#[serde(with = "decimal_u256")] U256),
    /// Literal boolean.
    Bool(bool),
    /// Literal string.
    String(String),
    /// Transfer limits, encoded as a 4-tuple.
    Limits(LimitConfig),
}

impl Argument {
    /// Reference to another component.
    pub fn reference(id: impl Into<ComponentId>) -> Self {
        Self::Ref(id.into())
    }

    /// Returns the referenced component, if this argument is a reference.
    #[must_use]
    pub fn referenced(&self) -> Option<&ComponentId> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }
}

impl From<Address> for Argument {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<U256> for Argument {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<LimitConfig> for Argument {
    fn from(limits: LimitConfig) -> Self {
        Self::Limits(limits)
    }
}

/// A fully resolved value handed to the execution primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// 20-byte address.
    Address(Address),
    /// 256-bit unsigned integer.
    Uint(U256),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Ordered tuple (struct argument).
    Tuple(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Tuple(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// DECIMAL U256 SERDE
// =============================================================================

/// Serde helpers writing `U256` as a decimal string.
///
/// Deserialization also accepts non-negative integers, so small values can be
/// written unquoted in TOML.
pub mod decimal_u256 {
    use super::{de, Deserializer, Serializer, Visitor, U256};
    use std::fmt;

    /// Serialize as a decimal string.
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Deserialize from a decimal string or a non-negative integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal string or non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<U256, E> {
            Ok(U256::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<U256, E> {
            u64::try_from(value)
                .map(U256::from)
                .map_err(|_| E::custom(format!("negative amount: {value}")))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<U256, E> {
            U256::from_dec_str(value.trim())
                .map_err(|e| E::custom(format!("invalid decimal amount {value:?}: {e:?}")))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
