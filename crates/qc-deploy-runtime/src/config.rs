//! # Deploy Configuration
//!
//! Typed configuration for a deployment run.
//!
//! Precedence, lowest first: built-in defaults, TOML file, `QC_DEPLOY_*`
//! environment variables, command-line flags. Limit amounts are written in
//! whole tokens and scaled to the smallest unit with `decimals`. The initial
//! supply is a whole-token integer passed to the ledger unscaled.

use qc_deploy_orchestrator::adapters::RetryPolicy;
use qc_deploy_orchestrator::domain::{
    parse_units, Address, LimitConfig, TokenDeployment, UnitsError, TOKEN_DECIMALS, U256,
};
use qc_deploy_orchestrator::service::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// First development account; calls are simulated so any non-zero address
/// works.
pub const DEFAULT_DEPLOYER: Address = Address::new([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79,
    0xcf, 0xff, 0xb9, 0x22, 0x66,
]);

/// Complete deploy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Token ledger parameters.
    pub token: TokenConfig,
    /// Default transfer limits.
    pub limits: LimitsConfig,
    /// Account the run is issued from.
    pub deployer: DeployerConfig,
    /// Orchestrator and primitive behaviour.
    pub execution: ExecutionConfig,
}

/// Token ledger parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Initial supply in whole tokens, passed to the ledger unscaled.
    pub initial_supply: String,
    /// Decimals used to scale amounts.
    pub decimals: u8,
    /// Whether the registry starts with whitelisting enforced.
    pub whitelist_enabled: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Optimized Stable Coin".to_string(),
            symbol: "OSC".to_string(),
            initial_supply: "1000000".to_string(),
            decimals: TOKEN_DECIMALS,
            whitelist_enabled: true,
        }
    }
}

/// Default transfer limits, amounts in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum amount per transfer.
    pub max_transfer_amount: String,
    /// Seconds between transfers from one account.
    pub cooldown_period_secs: u64,
    /// Maximum cumulative amount per period.
    pub period_limit: String,
    /// Period length in seconds.
    pub period_duration_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_transfer_amount: "10000".to_string(),
            cooldown_period_secs: 60,
            period_limit: "50000".to_string(),
            period_duration_secs: 86_400,
        }
    }
}

/// Account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// Deployer address.
    pub address: Address,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_DEPLOYER,
        }
    }
}

/// Orchestrator and primitive behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Reject malformed plans before any call.
    pub preflight_validation: bool,
    /// Retries for timed-out configuration calls. Zero disables retry.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_initial_delay_ms: u64,
    /// Upper bound on any retry delay.
    pub retry_max_delay_ms: u64,
    /// Simulated confirmation latency of the in-memory chain.
    pub confirmation_delay_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            preflight_validation: true,
            max_retries: 0,
            retry_initial_delay_ms: retry.initial_delay.as_millis() as u64,
            retry_max_delay_ms: retry.max_delay.as_millis() as u64,
            confirmation_delay_ms: 0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML parsing error.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Token name is empty.
    #[error("token name must not be empty")]
    EmptyTokenName,

    /// Token symbol is empty.
    #[error("token symbol must not be empty")]
    EmptySymbol,

    /// Period duration is zero.
    #[error("limits.period_duration_secs must be greater than zero")]
    ZeroPeriodDuration,

    /// Period limit is below the per-transfer maximum.
    #[error("limits.period_limit ({period_limit}) is below limits.max_transfer_amount ({max_transfer})")]
    PeriodLimitBelowTransferMax {
        /// Configured period limit.
        period_limit: String,
        /// Configured per-transfer maximum.
        max_transfer: String,
    },

    /// Deployer is the zero address.
    #[error("deployer address must not be zero")]
    ZeroDeployer,

    /// An amount could not be scaled.
    #[error("{field}: {source}")]
    InvalidAmount {
        /// Offending field.
        field: &'static str,
        /// Scaling error.
        #[source]
        source: UnitsError,
    },
}

impl DeployConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed input.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `QC_DEPLOY_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `QC_DEPLOY_*` overrides from `lookup`.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("QC_DEPLOY_TOKEN_NAME") {
            self.token.name = name;
        }
        if let Some(symbol) = lookup("QC_DEPLOY_TOKEN_SYMBOL") {
            self.token.symbol = symbol;
        }
        if let Some(supply) = lookup("QC_DEPLOY_INITIAL_SUPPLY") {
            self.token.initial_supply = supply;
        }
        if let Some(address) = lookup("QC_DEPLOY_DEPLOYER") {
            match address.parse::<Address>() {
                Ok(address) => {
                    self.deployer.address = address;
                    info!("Loaded deployer address from environment");
                }
                Err(e) => warn!("Ignoring QC_DEPLOY_DEPLOYER: {}", e),
            }
        }
        if let Some(value) = lookup("QC_DEPLOY_PREFLIGHT") {
            match value.parse() {
                Ok(enabled) => self.execution.preflight_validation = enabled,
                Err(_) => warn!("Ignoring QC_DEPLOY_PREFLIGHT: expected true or false"),
            }
        }
        if let Some(value) = lookup("QC_DEPLOY_MAX_RETRIES") {
            match value.parse() {
                Ok(retries) => self.execution.max_retries = retries,
                Err(_) => warn!("Ignoring QC_DEPLOY_MAX_RETRIES: expected an integer"),
            }
        }
        if let Some(value) = lookup("QC_DEPLOY_CONFIRMATION_DELAY_MS") {
            match value.parse() {
                Ok(ms) => self.execution.confirmation_delay_ms = ms,
                Err(_) => warn!("Ignoring QC_DEPLOY_CONFIRMATION_DELAY_MS: expected an integer"),
            }
        }
    }

    /// Checks the configuration before anything is deployed.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.name.trim().is_empty() {
            return Err(ConfigError::EmptyTokenName);
        }
        if self.token.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.limits.period_duration_secs == 0 {
            return Err(ConfigError::ZeroPeriodDuration);
        }
        if self.deployer.address.is_zero() {
            return Err(ConfigError::ZeroDeployer);
        }

        let limits = self.limit_config()?;
        if limits.period_limit < limits.max_transfer_amount {
            return Err(ConfigError::PeriodLimitBelowTransferMax {
                period_limit: self.limits.period_limit.clone(),
                max_transfer: self.limits.max_transfer_amount.clone(),
            });
        }
        self.initial_supply()?;
        Ok(())
    }

    /// Limits scaled to the smallest unit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if an amount does not parse.
    pub fn limit_config(&self) -> Result<LimitConfig, ConfigError> {
        Ok(LimitConfig {
            max_transfer_amount: self
                .scale("limits.max_transfer_amount", &self.limits.max_transfer_amount)?,
            cooldown_period_secs: self.limits.cooldown_period_secs,
            period_limit: self.scale("limits.period_limit", &self.limits.period_limit)?,
            period_duration_secs: self.limits.period_duration_secs,
        })
    }

    /// Parameters of the standard token plan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if an amount does not parse.
    pub fn token_deployment(&self) -> Result<TokenDeployment, ConfigError> {
        Ok(TokenDeployment {
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            initial_supply: self.initial_supply()?,
            whitelist_enabled: self.token.whitelist_enabled,
            limits: self.limit_config()?,
        })
    }

    /// Orchestrator configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            preflight_validation: self.execution.preflight_validation,
            ..ServiceConfig::default()
        }
    }

    /// Retry policy for configuration calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.execution.max_retries,
            initial_delay: Duration::from_millis(self.execution.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.execution.retry_max_delay_ms),
        }
    }

    fn initial_supply(&self) -> Result<U256, ConfigError> {
        parse_units(&self.token.initial_supply, 0).map_err(|source| ConfigError::InvalidAmount {
            field: "token.initial_supply",
            source,
        })
    }

    fn scale(&self, field: &'static str, amount: &str) -> Result<U256, ConfigError> {
        parse_units(amount, self.token.decimals)
            .map_err(|source| ConfigError::InvalidAmount { field, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_standard_deployment() {
        let config = DeployConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_deployment().unwrap(), TokenDeployment::default());
        assert_eq!(config.retry_policy().max_retries, 0);
        assert!(config.service_config().preflight_validation);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DeployConfig::parse(
            r#"
            [token]
            symbol = "TST"

            [limits]
            cooldown_period_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.token.symbol, "TST");
        assert_eq!(config.token.name, "Optimized Stable Coin");
        assert_eq!(config.limits.cooldown_period_secs, 5);
        assert_eq!(config.limits.period_duration_secs, 86_400);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QC_DEPLOY_TOKEN_SYMBOL", "ENV"),
            ("QC_DEPLOY_DEPLOYER", "0x0000000000000000000000000000000000000001"),
            ("QC_DEPLOY_MAX_RETRIES", "3"),
            ("QC_DEPLOY_PREFLIGHT", "not-a-bool"),
        ]
        .into_iter()
        .collect();

        let mut config = DeployConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.token.symbol, "ENV");
        assert_eq!(config.deployer.address, Address::new({
            let mut bytes = [0u8; 20];
            bytes[19] = 1;
            bytes
        }));
        assert_eq!(config.execution.max_retries, 3);
        // Unparseable value ignored.
        assert!(config.execution.preflight_validation);
    }

    #[test]
    fn test_initial_supply_not_scaled() {
        let mut config = DeployConfig::default();
        config.token.initial_supply = "2_500_000".into();

        let params = config.token_deployment().unwrap();
        assert_eq!(params.initial_supply, U256::from(2_500_000u64));
        assert_eq!(
            params.limits.max_transfer_amount,
            U256::from(10_000u64) * U256::exp10(18)
        );

        config.token.initial_supply = "1.5".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAmount {
                field: "token.initial_supply",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = DeployConfig::default();
        config.token.name = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTokenName)));

        let mut config = DeployConfig::default();
        config.limits.period_duration_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPeriodDuration)));

        let mut config = DeployConfig::default();
        config.limits.period_limit = "100".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PeriodLimitBelowTransferMax { .. })
        ));

        let mut config = DeployConfig::default();
        config.deployer.address = Address::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDeployer)));

        let mut config = DeployConfig::default();
        config.token.initial_supply = "lots".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAmount {
                field: "token.initial_supply",
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.toml");
        fs::write(
            &path,
            "[deployer]\naddress = \"0x1111111111111111111111111111111111111111\"\n",
        )
        .unwrap();

        let config = DeployConfig::load(&path).unwrap();
        assert_eq!(config.deployer.address, Address::new([0x11; 20]));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DeployConfig::load("/nonexistent/deploy.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
