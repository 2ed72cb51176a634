//! # Deployment Run
//!
//! Wires configuration, plan and the in-memory chain together, runs the
//! orchestrator and reports the outcome.

use crate::cli::Args;
use crate::config::DeployConfig;
use crate::summary::{render_failure, render_success, AddressBook};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use qc_deploy_orchestrator::adapters::{InMemoryChain, RetryingPrimitive, TomlPlanLoader};
use qc_deploy_orchestrator::domain::{standard_token_plan, DeploymentPlan};
use qc_deploy_orchestrator::ports::{DeploymentApi, ExecutionPrimitive};
use qc_deploy_orchestrator::service::DeploymentService;
use std::time::Duration;
use tracing::{info, warn};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every component and step confirmed.
    Complete,
    /// The run halted; live components are listed in the summary.
    Halted,
    /// `--validate-only` and the plan is valid.
    Valid,
    /// `--validate-only` and the plan is invalid.
    Invalid,
}

impl Outcome {
    /// Returns true for a zero exit code.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Complete | Self::Valid)
    }
}

/// Builds the effective configuration: file, then environment, then flags.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the result is invalid.
pub fn resolve_config(args: &Args) -> Result<DeployConfig> {
    let mut config = match &args.config {
        Some(path) => DeployConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DeployConfig::default(),
    };
    config.apply_env();

    if let Some(deployer) = args.deployer {
        config.deployer.address = deployer;
    }
    if args.no_preflight {
        config.execution.preflight_validation = false;
    }
    if let Some(retries) = args.max_retries {
        config.execution.max_retries = retries;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Loads the plan file, or builds the standard token plan.
///
/// # Errors
///
/// Returns an error if the plan file cannot be loaded.
pub fn resolve_plan(args: &Args, config: &DeployConfig) -> Result<DeploymentPlan> {
    match &args.plan {
        Some(path) => TomlPlanLoader::load(path)
            .with_context(|| format!("Failed to load plan {}", path.display())),
        None => Ok(standard_token_plan(
            &config.token_deployment()?,
            config.deployer.address,
        )),
    }
}

/// Runs one deployment end to end and prints its summary.
///
/// # Errors
///
/// Returns an error for configuration, plan loading or I/O problems. A
/// halted deployment is an [`Outcome`], not an error.
pub async fn run(args: &Args) -> Result<Outcome> {
    let config = resolve_config(args)?;
    let plan = resolve_plan(args, &config)?;
    let deployer = config.deployer.address;

    let mut chain = InMemoryChain::new(deployer);
    if config.execution.confirmation_delay_ms > 0 {
        chain = chain
            .with_confirmation_delay(Duration::from_millis(config.execution.confirmation_delay_ms));
    }
    let primitive = RetryingPrimitive::new(chain, config.retry_policy());
    let service = DeploymentService::new(primitive, config.service_config());

    if args.validate_only {
        return Ok(match service.validate(&plan) {
            Ok(()) => {
                println!(
                    "Plan is valid: {} components, {} steps",
                    plan.components.len(),
                    plan.steps.len()
                );
                Outcome::Valid
            }
            Err(e) => {
                println!("Plan is invalid: {e}");
                Outcome::Invalid
            }
        });
    }

    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    println!(
        "Deploying contracts with the account: {}",
        service.primitive().caller()
    );
    println!("Start time: {started_at}");
    if !service.config().preflight_validation {
        warn!("Pre-flight validation disabled");
    }
    let retries = service.primitive().policy().max_retries;
    if retries > 0 {
        info!(retries, "Timed-out configuration calls will be retried");
    }

    match service.run(&plan).await {
        Ok(report) => {
            print!("{}", render_success(&report, &plan));
            if let Some(path) = &args.out {
                AddressBook::complete(&report, deployer, started_at).write_to(path)?;
                info!("Address book written to {}", path.display());
            }
            Ok(Outcome::Complete)
        }
        Err(failure) => {
            print!("{}", render_failure(&failure, &plan));
            if let Some(path) = &args.out {
                AddressBook::halted(&failure, deployer, started_at).write_to(path)?;
                info!("Address book written to {}", path.display());
            }
            Ok(Outcome::Halted)
        }
    }
}
