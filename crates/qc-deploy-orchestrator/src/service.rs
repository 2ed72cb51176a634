//! # Deployment Service
//!
//! The orchestrator. Walks a plan strictly in order: pre-flight validation,
//! every component, then every configuration step. Each external call is
//! awaited before the next one is issued.
//!
//! ## Failure semantics
//!
//! - The first failure stops the run. Nothing after it is attempted.
//! - The partial report keeps every confirmed call. Components it lists are
//!   live and are not rolled back.
//! - No timeouts are applied here; they surface from the primitive.

use crate::configurator::StepExecutor;
use crate::domain::{
    into_deploy_error, validate_plan, ComponentCatalog, ComponentSpec, ConfigurationStep,
    DeployError, DeploymentFailure, DeploymentPlan, DeploymentReport, PlanPosition,
    ProvisionRecord, ResolutionTable, StepRecord,
};
use crate::ports::inbound::DeploymentApi;
use crate::ports::outbound::ExecutionPrimitive;
use crate::provisioner::Provisioner;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Deployment service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Reject malformed plans before any external call.
    pub preflight_validation: bool,
    /// Interfaces used for arity and type checks during pre-flight.
    pub catalog: ComponentCatalog,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            preflight_validation: true,
            catalog: ComponentCatalog::standard(),
        }
    }
}

/// Statistics for the deployment service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Runs started.
    pub runs_started: u64,
    /// Runs that reached the fully configured state.
    pub runs_succeeded: u64,
    /// Runs that halted.
    pub runs_failed: u64,
    /// Runs rejected by pre-flight validation.
    pub plans_rejected: u64,
    /// Components created across all runs.
    pub components_provisioned: u64,
    /// Configuration calls confirmed across all runs.
    pub steps_executed: u64,
    /// Duration of the last run in milliseconds.
    pub last_run_ms: u64,
}

/// The orchestrator.
pub struct DeploymentService<E: ExecutionPrimitive> {
    /// Service configuration.
    config: ServiceConfig,
    /// Shared execution primitive.
    primitive: Arc<E>,
    provisioner: Provisioner<E>,
    executor: StepExecutor<E>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<E: ExecutionPrimitive> DeploymentService<E> {
    /// Creates a service that owns `primitive`.
    pub fn new(primitive: E, config: ServiceConfig) -> Self {
        Self::with_shared(Arc::new(primitive), config)
    }

    /// Creates a service over a primitive the caller keeps a handle to.
    pub fn with_shared(primitive: Arc<E>, config: ServiceConfig) -> Self {
        Self {
            config,
            provisioner: Provisioner::new(Arc::clone(&primitive)),
            executor: StepExecutor::new(Arc::clone(&primitive)),
            primitive,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The execution primitive.
    pub fn primitive(&self) -> &E {
        &self.primitive
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Runs `plan` to completion or to its first failure.
    #[instrument(
        skip_all,
        fields(
            run_id = %run_id,
            components = plan.components.len(),
            steps = plan.steps.len()
        )
    )]
    async fn run_plan(
        &self,
        plan: &DeploymentPlan,
        run_id: Uuid,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        let start = Instant::now();
        let mut report = DeploymentReport::new(run_id);
        self.stats.write().await.runs_started += 1;

        info!(account = %self.primitive.caller(), "Starting deployment");

        if self.config.preflight_validation {
            if let Err(err) = validate_plan(plan, &self.config.catalog) {
                let position = err.position();
                self.stats.write().await.plans_rejected += 1;
                return Err(self
                    .halt(plan, report, position, into_deploy_error(err, plan), start)
                    .await);
            }
        }

        info!("Provisioning {} components", plan.components.len());
        for (i, spec) in plan.components.iter().enumerate() {
            let position = PlanPosition::Component(i);
            let record = match self.provisioner.provision(spec, &report.resolved).await {
                Ok(record) => record,
                Err(err) => return Err(self.halt(plan, report, position, err, start).await),
            };

            let (id, address) = (record.component.clone(), record.address);
            report.provisioned.push(record);
            self.stats.write().await.components_provisioned += 1;
            if let Err(err) = report.resolved.insert(id, address) {
                return Err(self.halt(plan, report, position, err, start).await);
            }
        }

        info!("Configuring {} steps", plan.steps.len());
        for (i, step) in plan.steps.iter().enumerate() {
            let position = PlanPosition::Step(i);
            match self.executor.execute(step, &report.resolved).await {
                Ok(record) => {
                    report.configured.push(record);
                    self.stats.write().await.steps_executed += 1;
                }
                Err(err) => return Err(self.halt(plan, report, position, err, start).await),
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        {
            let mut stats = self.stats.write().await;
            stats.runs_succeeded += 1;
            stats.last_run_ms = elapsed_ms;
        }
        info!(
            resolved = report.resolved.len(),
            calls = report.calls_confirmed(),
            elapsed_ms,
            "Deployment complete"
        );
        Ok(report)
    }

    async fn halt(
        &self,
        plan: &DeploymentPlan,
        report: DeploymentReport,
        position: PlanPosition,
        error: DeployError,
        start: Instant,
    ) -> DeploymentFailure {
        let entry = plan
            .entry_label(position)
            .unwrap_or_else(|| position.to_string());
        error!(
            %position,
            entry = %entry,
            error = %error,
            live_components = report.resolved.len(),
            "Deployment halted"
        );

        {
            let mut stats = self.stats.write().await;
            stats.runs_failed += 1;
            stats.last_run_ms = start.elapsed().as_millis() as u64;
        }
        DeploymentFailure {
            report,
            position,
            entry,
            error,
        }
    }
}

#[async_trait]
impl<E: ExecutionPrimitive> DeploymentApi for DeploymentService<E> {
    async fn provision(
        &self,
        spec: &ComponentSpec,
        resolved: &ResolutionTable,
    ) -> Result<ProvisionRecord, DeployError> {
        self.provisioner.provision(spec, resolved).await
    }

    async fn execute(
        &self,
        step: &ConfigurationStep,
        resolved: &ResolutionTable,
    ) -> Result<StepRecord, DeployError> {
        self.executor.execute(step, resolved).await
    }

    async fn run(&self, plan: &DeploymentPlan) -> Result<DeploymentReport, DeploymentFailure> {
        self.run_plan(plan, Uuid::new_v4()).await
    }

    fn validate(&self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        validate_plan(plan, &self.config.catalog).map_err(|err| into_deploy_error(err, plan))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Fault, InMemoryChain, RetryPolicy, RetryingPrimitive};
    use crate::domain::{standard_token_plan, Address, Argument, PlanError, TokenDeployment};

    fn service() -> (Arc<InMemoryChain>, DeploymentService<InMemoryChain>) {
        let chain = Arc::new(InMemoryChain::new(Address::new([0xde; 20])));
        let service = DeploymentService::with_shared(Arc::clone(&chain), ServiceConfig::default());
        (chain, service)
    }

    #[tokio::test]
    async fn test_standard_plan_succeeds() {
        let (chain, service) = service();
        let plan = standard_token_plan(&TokenDeployment::default(), chain.caller());

        let report = service.run(&plan).await.unwrap();
        assert_eq!(report.resolved.len(), 3);
        assert_eq!(report.configured.len(), 4);
        assert_eq!(chain.call_count(), 7);

        let stats = service.stats().await;
        assert_eq!(stats.runs_succeeded, 1);
        assert_eq!(stats.components_provisioned, 3);
        assert_eq!(stats.steps_executed, 4);
    }

    #[tokio::test]
    async fn test_step_failure_keeps_partial_report() {
        let (chain, service) = service();
        chain.inject(Fault::on_call("setExemption").reject("not owner"));
        let plan = standard_token_plan(&TokenDeployment::default(), chain.caller());

        let failure = service.run(&plan).await.unwrap_err();
        assert_eq!(failure.position, PlanPosition::Step(1));
        assert_eq!(failure.entry, "limiter.setExemption");
        assert_eq!(failure.report.resolved.len(), 3);
        assert_eq!(failure.report.configured.len(), 1);
        // 3 creates, 1 confirmed step, 1 rejected step, nothing after
        assert_eq!(chain.call_count(), 5);
    }

    #[tokio::test]
    async fn test_preflight_rejects_before_any_call() {
        let (chain, service) = service();
        let plan = DeploymentPlan::new()
            .component(ComponentSpec::new("a", "A"))
            .component(ComponentSpec::new("a", "A"));

        let failure = service.run(&plan).await.unwrap_err();
        assert!(matches!(
            failure.error,
            DeployError::InvalidPlan(PlanError::DuplicateComponent { .. })
        ));
        assert_eq!(chain.call_count(), 0);
        assert_eq!(service.stats().await.plans_rejected, 1);
    }

    #[tokio::test]
    async fn test_duplicate_without_preflight_halts_on_write_once() {
        let chain = Arc::new(InMemoryChain::new(Address::new([0xde; 20])));
        let config = ServiceConfig {
            preflight_validation: false,
            ..ServiceConfig::default()
        };
        let service = DeploymentService::with_shared(Arc::clone(&chain), config);
        let plan = DeploymentPlan::new()
            .component(ComponentSpec::new("a", "A"))
            .component(ComponentSpec::new("a", "A"));

        let failure = service.run(&plan).await.unwrap_err();
        assert_eq!(
            failure.error,
            DeployError::AlreadyResolved {
                component: "a".into()
            }
        );
        assert_eq!(failure.position, PlanPosition::Component(1));
        // The second component is live even though its id was rejected.
        assert_eq!(failure.report.provisioned.len(), 2);
        assert_eq!(failure.report.resolved.len(), 1);
    }

    #[tokio::test]
    async fn test_service_exposes_primitive_and_config() {
        let retrying = RetryingPrimitive::new(
            InMemoryChain::new(Address::new([0xde; 20])),
            RetryPolicy::disabled(),
        );
        let config = ServiceConfig {
            preflight_validation: false,
            ..ServiceConfig::default()
        };
        let service = DeploymentService::new(retrying, config);

        assert_eq!(service.primitive().caller(), Address::new([0xde; 20]));
        assert_eq!(service.primitive().policy().max_retries, 0);
        assert!(!service.config().preflight_validation);
    }

    #[tokio::test]
    async fn test_validate_issues_no_call() {
        let (chain, service) = service();
        let plan = DeploymentPlan::new().step(
            ConfigurationStep::new("registry", "authorizeContract")
                .arg(Argument::reference("ledger")),
        );
        assert!(service.validate(&plan).is_err());
        assert_eq!(chain.call_count(), 0);
    }
}
