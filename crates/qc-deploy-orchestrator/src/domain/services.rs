//! # Domain Services
//!
//! Pure helpers: reference substitution, unit scaling and address
//! derivation.

use super::entities::{ComponentSpec, ConfigurationStep, ResolutionTable};
use super::errors::DeployError;
use super::value_objects::{Address, Argument, Hash, Value, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;

// =============================================================================
// ARGUMENT RESOLUTION
// =============================================================================

/// Substitutes a reference with its resolved address. Literals pass through.
///
/// # Errors
///
/// Returns `UnresolvedDependency` if a reference has no address yet.
pub fn resolve_argument(
    arg: &Argument,
    table: &ResolutionTable,
    needed_by: &str,
) -> Result<Value, DeployError> {
    Ok(match arg {
        Argument::Ref(id) => Value::Address(table.require(id, needed_by)?),
        Argument::Address(address) => Value::Address(*address),
        Argument::Uint(value) => Value::Uint(*value),
        Argument::Bool(value) => Value::Bool(*value),
        Argument::String(value) => Value::String(value.clone()),
        Argument::Limits(limits) => limits.to_value(),
    })
}

/// Resolves arguments in order, stopping at the first unresolved reference.
///
/// # Errors
///
/// Returns `UnresolvedDependency` for the first reference with no address.
pub fn resolve_arguments(
    args: &[Argument],
    table: &ResolutionTable,
    needed_by: &str,
) -> Result<Vec<Value>, DeployError> {
    args.iter()
        .map(|arg| resolve_argument(arg, table, needed_by))
        .collect()
}

/// Resolves a component's constructor parameters.
///
/// # Errors
///
/// Returns `UnresolvedDependency` if a referenced component is not resolved.
pub fn resolve_constructor(
    spec: &ComponentSpec,
    table: &ResolutionTable,
) -> Result<Vec<Value>, DeployError> {
    spec.constructor_params
        .iter()
        .map(|param| resolve_argument(&param.value, table, spec.id.as_str()))
        .collect()
}

/// Resolves a step's target address and arguments.
///
/// # Errors
///
/// Returns `UnresolvedDependency` if the target or a referenced argument is
/// not resolved. The target is checked first.
pub fn resolve_step(
    step: &ConfigurationStep,
    table: &ResolutionTable,
) -> Result<(Address, Vec<Value>), DeployError> {
    let label = step.label();
    let target = table.require(&step.target, &label)?;
    let args = resolve_arguments(&step.args, table, &label)?;
    Ok((target, args))
}

// =============================================================================
// UNIT SCALING
// =============================================================================

/// Decimals of the token ledger.
pub const TOKEN_DECIMALS: u8 = 18;

/// Errors from [`parse_units`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    /// Input is empty or contains something other than digits and one dot.
    #[error("invalid decimal amount: {0:?}")]
    Invalid(String),

    /// More fractional digits than the unit allows.
    #[error("{amount} has more than {decimals} fractional digits")]
    TooPrecise {
        /// Input amount.
        amount: String,
        /// Allowed fractional digits.
        decimals: u8,
    },

    /// Scaled amount does not fit in 256 bits.
    #[error("{0} overflows uint256")]
    Overflow(String),
}

/// Scales a human decimal amount to the smallest unit.
///
/// `parse_units("1.5", 18)` is `1_500_000_000_000_000_000`. Underscores are
/// accepted as digit separators.
///
/// # Errors
///
/// Returns [`UnitsError`] for malformed, over-precise or oversized input.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let cleaned: String = amount.trim().chars().filter(|c| *c != '_').collect();
    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::Invalid(amount.to_string()));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(UnitsError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }

    let padded = format!(
        "{whole}{fraction}{}",
        "0".repeat(usize::from(decimals) - fraction.len())
    );
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| UnitsError::Overflow(amount.to_string()))
}

// =============================================================================
// ADDRESS DERIVATION
// =============================================================================

/// Computes a component address from its creator and the creator's nonce.
///
/// Address = keccak256(rlp(\[creator, nonce\]))\[12:\]
#[must_use]
pub fn compute_component_address(creator: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // 20-byte string header
    content.push(0x94);
    content.extend_from_slice(creator.as_bytes());

    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 128 {
        content.push(nonce as u8);
    } else {
        let nonce_bytes = trimmed_be_bytes(nonce);
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // Content is at most 30 bytes, always a short list.
    let mut rlp_data = Vec::with_capacity(content.len() + 1);
    rlp_data.push(0xc0 + content.len() as u8);
    rlp_data.extend_from_slice(&content);

    let hash = Keccak256::digest(&rlp_data);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

fn trimmed_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

/// Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Hash::new(out)
}

// =============================================================================
// TESTS
// =============================================================================
