//! TOML plan files.
//!
//! ```toml
//! [[component]]
//! id = "registry"
//! kind = "Whitelist"
//! params = [{ name = "whitelistEnabled", value = { bool = true } }]
//!
//! [[step]]
//! target = "registry"
//! operation = "authorizeContract"
//! args = [{ ref = "ledger" }]
//! ```

use crate::domain::DeploymentPlan;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors loading a plan file.
#[derive(Debug, Error)]
pub enum PlanLoadError {
    /// File could not be read.
    #[error("failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// Content is not a valid plan.
    #[error("failed to parse plan: {0}")]
    Parse(String),
}

/// Loads [`DeploymentPlan`]s from TOML.
pub struct TomlPlanLoader;

impl TomlPlanLoader {
    /// Loads a plan from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PlanLoadError` if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DeploymentPlan, PlanLoadError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| PlanLoadError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parses a plan from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `PlanLoadError::Parse` on malformed input.
    pub fn parse(content: &str) -> Result<DeploymentPlan, PlanLoadError> {
        toml::from_str(content).map_err(|e| PlanLoadError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Argument, LimitConfig, U256};

    const PLAN: &str = r#"
        [[component]]
        id = "registry"
        kind = "Whitelist"
        params = [{ name = "whitelistEnabled", value = { bool = true } }]

        [[component]]
        id = "limiter"
        kind = "TransferLimiter"

        [[component]]
        id = "ledger"
        kind = "StableCoin"
        display_name = "Optimized Stable Coin"
        params = [
            { name = "name", value = { string = "Optimized Stable Coin" } },
            { name = "symbol", value = { string = "OSC" } },
            { name = "initialSupply", value = { uint = "1000000000000000000000000" } },
            { name = "whitelist", value = { ref = "registry" } },
            { name = "transferLimiter", value = { ref = "limiter" } },
        ]

        [[step]]
        target = "limiter"
        operation = "setAllDefaultLimits"
        description = "default limits"
        args = [
            { ref = "ledger" },
            { limits = { max_transfer_amount = "10000", cooldown_period_secs = 60, period_limit = "50000", period_duration_secs = 86400 } },
        ]

        [[step]]
        target = "registry"
        operation = "authorizeContract"
        args = [{ ref = "ledger" }]
    "#;

    #[test]
    fn test_parse_plan() {
        let plan = TomlPlanLoader::parse(PLAN).unwrap();
        assert_eq!(plan.components.len(), 3);
        assert_eq!(plan.steps.len(), 2);

        let ledger = &plan.components[2];
        assert_eq!(ledger.display(), "Optimized Stable Coin");
        assert_eq!(
            ledger.constructor_params[2].value,
            Argument::Uint(U256::exp10(24))
        );

        assert_eq!(
            plan.steps[0].args[1],
            Argument::Limits(LimitConfig {
                max_transfer_amount: U256::from(10_000),
                cooldown_period_secs: 60,
                period_limit: U256::from(50_000),
                period_duration_secs: 86_400,
            })
        );
        assert_eq!(plan.steps[1].args, vec![Argument::reference("ledger")]);
    }

    #[test]
    fn test_parse_rejects_unknown_argument_tag() {
        let bad = r#"
            [[step]]
            target = "registry"
            operation = "authorizeContract"
            args = [{ pointer = "ledger" }]
        "#;
        assert!(matches!(
            TomlPlanLoader::parse(bad),
            Err(PlanLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TomlPlanLoader::load("/nonexistent/plan.toml").unwrap_err();
        assert!(matches!(err, PlanLoadError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, PLAN).unwrap();

        let plan = TomlPlanLoader::load(&path).unwrap();
        assert_eq!(plan.len(), 5);
    }
}
