//! # Configuration Step Executor
//!
//! Issues one post-provisioning call per step. There is no deduplication:
//! executing the same step twice issues two calls.

use crate::domain::{resolve_step, ConfigurationStep, DeployError, ResolutionTable, StepRecord};
use crate::ports::outbound::ExecutionPrimitive;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Executes configuration steps through an [`ExecutionPrimitive`].
pub struct StepExecutor<E> {
    primitive: Arc<E>,
}

impl<E: ExecutionPrimitive> StepExecutor<E> {
    /// Creates an executor over a shared primitive.
    pub fn new(primitive: Arc<E>) -> Self {
        Self { primitive }
    }

    /// Executes `step` against the resolved target.
    ///
    /// # Errors
    ///
    /// - `UnresolvedDependency` if the target or a referenced argument has no
    ///   address. No call is issued.
    /// - `ConfigurationFailed` if the call does not confirm. A call against an
    ///   address with no component is reported as `StaleAddress`.
    #[instrument(skip_all, fields(step = %step.label()))]
    pub async fn execute(
        &self,
        step: &ConfigurationStep,
        resolved: &ResolutionTable,
    ) -> Result<StepRecord, DeployError> {
        let (target_address, args) = resolve_step(step, resolved)?;
        debug!(address = %target_address, args = ?args, "Resolved step arguments");

        match &step.description {
            Some(description) => info!("{}...", description),
            None => info!("Calling {}...", step.label()),
        }

        let confirmation = self
            .primitive
            .call(target_address, &step.operation, &args)
            .await
            .map_err(|err| {
                warn!(error = %err, "Configuration call failed");
                DeployError::ConfigurationFailed {
                    target: step.target.clone(),
                    operation: step.operation.clone(),
                    cause: err.into(),
                }
            })?;

        debug!(block = confirmation.block_number, "Step confirmed");
        Ok(StepRecord {
            target: step.target.clone(),
            operation: step.operation.clone(),
            target_address,
            args,
            confirmation,
        })
    }
}
