//! # Presets
//!
//! The standard token deployment: an access-control registry, a
//! rate-limiting policy engine and a token ledger wired to both.

use super::catalog::{STABLE_COIN, TRANSFER_LIMITER, WHITELIST};
use super::entities::{ComponentSpec, ConfigurationStep, DeploymentPlan};
use super::services::TOKEN_DECIMALS;
use super::value_objects::{Address, Argument, LimitConfig, U256};
use serde::{Deserialize, Serialize};

/// Id of the access-control registry in the standard plan.
pub const REGISTRY_ID: &str = "registry";
/// Id of the policy engine in the standard plan.
pub const LIMITER_ID: &str = "limiter";
/// Id of the token ledger in the standard plan.
pub const LEDGER_ID: &str = "ledger";

/// Parameters of the standard token deployment.
///
/// Limit amounts are in the smallest unit. The initial supply is passed to
/// the ledger constructor as is; the ledger applies its own decimals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeployment {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Supply minted to the deployer, in whole tokens.
    #[serde(with = "super::value_objects::decimal_u256")]
    pub initial_supply: U256,
    /// Whether the registry starts with whitelisting enforced.
    pub whitelist_enabled: bool,
    /// Default limits applied to the ledger.
    pub limits: LimitConfig,
}

impl Default for TokenDeployment {
    fn default() -> Self {
        let unit = U256::exp10(usize::from(TOKEN_DECIMALS));
        Self {
            name: "Optimized Stable Coin".to_string(),
            symbol: "OSC".to_string(),
            initial_supply: U256::from(1_000_000u64),
            whitelist_enabled: true,
            limits: LimitConfig {
                max_transfer_amount: U256::from(10_000u64) * unit,
                cooldown_period_secs: 60,
                period_limit: U256::from(50_000u64) * unit,
                period_duration_secs: 86_400,
            },
        }
    }
}

/// Builds the three-component token plan.
///
/// The deployer is exempted from the limits so the initial supply can be
/// distributed, and the ledger is authorized on both the registry and the
/// limiter.
#[must_use]
pub fn standard_token_plan(params: &TokenDeployment, deployer: Address) -> DeploymentPlan {
    DeploymentPlan::new()
        .component(
            ComponentSpec::new(REGISTRY_ID, WHITELIST)
                .named("Whitelist")
                .param("whitelistEnabled", params.whitelist_enabled),
        )
        .component(ComponentSpec::new(LIMITER_ID, TRANSFER_LIMITER).named("TransferLimiter"))
        .component(
            ComponentSpec::new(LEDGER_ID, STABLE_COIN)
                .named(params.name.clone())
                .param("name", Argument::String(params.name.clone()))
                .param("symbol", Argument::String(params.symbol.clone()))
                .param("initialSupply", params.initial_supply)
                .param("whitelist", Argument::reference(REGISTRY_ID))
                .param("transferLimiter", Argument::reference(LIMITER_ID)),
        )
        .step(
            ConfigurationStep::new(LIMITER_ID, "setAllDefaultLimits")
                .arg(Argument::reference(LEDGER_ID))
                .arg(params.limits)
                .described("Set default transfer limits for the ledger"),
        )
        .step(
            ConfigurationStep::new(LIMITER_ID, "setExemption")
                .arg(Argument::reference(LEDGER_ID))
                .arg(deployer)
                .arg(true)
                .described("Exempt the deployer from transfer limits"),
        )
        .step(
            ConfigurationStep::new(REGISTRY_ID, "authorizeContract")
                .arg(Argument::reference(LEDGER_ID))
                .described("Authorize the ledger on the registry"),
        )
        .step(
            ConfigurationStep::new(LIMITER_ID, "authorizeContract")
                .arg(Argument::reference(LEDGER_ID))
                .described("Authorize the ledger on the limiter"),
        )
}
