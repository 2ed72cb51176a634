//! # Driving Ports (API - Inbound)
//!
//! The interface the runtime (or any embedding tool) drives a deployment
//! through.

use crate::domain::{
    ComponentSpec, ConfigurationStep, DeployError, DeploymentFailure, DeploymentPlan,
    DeploymentReport, ProvisionRecord, ResolutionTable, StepRecord,
};
use async_trait::async_trait;

/// Primary API for deploying a plan.
///
/// ## Usage
///
/// ```ignore
/// let report = api.run(&plan).await?;
/// for (id, address) in report.resolved.iter() {
///     println!("{id}: {address}");
/// }
/// ```
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Creates one component.
    ///
    /// Does not touch `resolved`; the caller records the returned address.
    async fn provision(
        &self,
        spec: &ComponentSpec,
        resolved: &ResolutionTable,
    ) -> Result<ProvisionRecord, DeployError>;

    /// Issues one configuration call. Calling it twice issues two calls.
    async fn execute(
        &self,
        step: &ConfigurationStep,
        resolved: &ResolutionTable,
    ) -> Result<StepRecord, DeployError>;

    /// Runs the whole plan: pre-flight, every component, then every step.
    ///
    /// Stops at the first failure and returns what was confirmed so far.
    async fn run(&self, plan: &DeploymentPlan) -> Result<DeploymentReport, DeploymentFailure>;

    /// Static checks only. Issues no external call.
    fn validate(&self, plan: &DeploymentPlan) -> Result<(), DeployError>;
}
