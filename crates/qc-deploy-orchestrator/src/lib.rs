//! # QC Deployment Orchestrator
//!
//! Dependency-ordered provisioning and configuration of on-chain components.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Deploy a small set of interdependent components and wire them together in
//! a single run:
//! - Components are created strictly in plan order; each address is recorded
//!   in a write-once resolution table as soon as it confirms
//! - Constructor parameters and call arguments may reference earlier
//!   components by id; references are substituted just before each call
//! - Configuration steps run after every component exists
//! - The first failure halts the run with a partial report of every live
//!   component
//!
//! ## Failure taxonomy
//!
//! | Error | Meaning | Retry? |
//! |-------|---------|--------|
//! | `UnresolvedDependency` | Plan references something not yet resolved | Never, fix the plan |
//! | `InvalidPlan` | Pre-flight found a malformed plan | Never, fix the plan |
//! | `ProvisioningFailed` | `create` did not confirm | Never, a retry makes a new address |
//! | `ConfigurationFailed` (Timeout) | Call did not confirm in time | Opt-in via `RetryingPrimitive` |
//! | `ConfigurationFailed` (Rejected) | Call reverted | Never |
//! | `ConfigurationFailed` (StaleAddress) | Resolved address holds no component | Never, the table is wrong |
//!
//! ## Module Structure
//!
//! ```text
//! qc-deploy-orchestrator/
//! ├── domain/          # Plan, resolution table, catalog, invariants, errors
//! ├── ports/           # DeploymentApi, ExecutionPrimitive
//! ├── adapters/        # InMemoryChain, RetryingPrimitive, TomlPlanLoader
//! ├── provisioner.rs   # One component, one create
//! ├── configurator.rs  # One step, one call
//! └── service.rs       # DeploymentService (the orchestrator)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use qc_deploy_orchestrator::prelude::*;
//!
//! let chain = InMemoryChain::new(deployer);
//! let plan = standard_token_plan(&TokenDeployment::default(), deployer);
//! let service = DeploymentService::new(chain, ServiceConfig::default());
//!
//! match service.run(&plan).await {
//!     Ok(report) => println!("{} components live", report.resolved.len()),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod configurator;
pub mod domain;
pub mod ports;
pub mod provisioner;
pub mod service;

/// Prelude for convenient imports.
pub mod prelude {
    // Domain
    pub use crate::domain::catalog::{ComponentCatalog, ComponentInterface, ParamType};
    pub use crate::domain::entities::{
        ComponentSpec, Confirmation, ConfigurationStep, ConstructorParam, DeploymentFailure,
        DeploymentPlan, DeploymentReport, PlanPosition, ProvisionRecord, ResolutionTable,
        StepRecord,
    };
    pub use crate::domain::errors::{
        DeployError, ExecutionError, FailureCause, PlanError,
    };
    pub use crate::domain::presets::{standard_token_plan, TokenDeployment};
    pub use crate::domain::services::{parse_units, TOKEN_DECIMALS};
    pub use crate::domain::value_objects::{
        Address, Argument, ComponentId, Hash, LimitConfig, Value, U256,
    };

    // Ports
    pub use crate::ports::inbound::DeploymentApi;
    pub use crate::ports::outbound::ExecutionPrimitive;

    // Adapters
    pub use crate::adapters::{
        Fault, InMemoryChain, RetryPolicy, RetryingPrimitive, TomlPlanLoader,
    };

    // Service
    pub use crate::service::{DeploymentService, ServiceConfig, ServiceStats};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = ServiceConfig::default();
        let _ = Address::ZERO;
        let _ = ComponentCatalog::standard();
    }
}
