//! # Deployment Scenarios (qc-deploy-orchestrator)
//!
//! End-to-end runs against the in-memory chain.
//!
//! ## Test Categories
//!
//! 1. **Happy path** - Ordering, one address per component, substitution
//! 2. **Provisioning failures** - Partial table, no steps attempted
//! 3. **Unresolved references** - With and without pre-flight
//! 4. **Re-execution and retry** - No dedup, opt-in timeout retry

use qc_deploy_orchestrator::adapters::RecordedCall;
use qc_deploy_orchestrator::prelude::*;
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn deployer() -> Address {
    Address::new([0xde; 20])
}

fn make_service(preflight: bool) -> (Arc<InMemoryChain>, DeploymentService<InMemoryChain>) {
    init_tracing();
    let chain = Arc::new(InMemoryChain::new(deployer()));
    let config = ServiceConfig {
        preflight_validation: preflight,
        ..ServiceConfig::default()
    };
    (
        Arc::clone(&chain),
        DeploymentService::with_shared(chain, config),
    )
}

fn token_plan() -> DeploymentPlan {
    standard_token_plan(&TokenDeployment::default(), deployer())
}

fn confirmed_calls(chain: &InMemoryChain) -> Vec<(Address, String, Vec<Value>)> {
    chain
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RecordedCall::Call {
                target,
                operation,
                args,
                confirmed: true,
            } => Some((target, operation, args)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[tokio::test]
async fn test_three_components_four_steps_in_order() {
    let (chain, service) = make_service(true);

    let report = service.run(&token_plan()).await.unwrap();

    let ids: Vec<_> = report.resolved.ids().map(ComponentId::as_str).collect();
    assert_eq!(ids, vec!["registry", "limiter", "ledger"]);

    let operations: Vec<_> = report
        .configured
        .iter()
        .map(|r| format!("{}.{}", r.target, r.operation))
        .collect();
    assert_eq!(
        operations,
        vec![
            "limiter.setAllDefaultLimits",
            "limiter.setExemption",
            "registry.authorizeContract",
            "limiter.authorizeContract",
        ]
    );
    assert_eq!(chain.call_count(), 7);
}

#[tokio::test]
async fn test_ledger_address_substituted_everywhere() {
    let (chain, service) = make_service(true);

    let report = service.run(&token_plan()).await.unwrap();
    let ledger = report.resolved.get(&"ledger".into()).unwrap();
    let registry = report.resolved.get(&"registry".into()).unwrap();
    let limiter = report.resolved.get(&"limiter".into()).unwrap();

    let calls = confirmed_calls(&chain);
    assert_eq!(calls.len(), 4);
    for (_, operation, args) in &calls {
        assert_eq!(args[0], Value::Address(ledger), "{operation}");
    }
    assert_eq!(calls[0].0, limiter);
    assert_eq!(calls[2].0, registry);

    // Ledger constructor received the registry and limiter addresses.
    let ledger_create = chain
        .calls()
        .into_iter()
        .find_map(|call| match call {
            RecordedCall::Create { kind, args, .. } if kind == "StableCoin" => Some(args),
            _ => None,
        })
        .unwrap();
    assert_eq!(ledger_create[3], Value::Address(registry));
    assert_eq!(ledger_create[4], Value::Address(limiter));
}

#[tokio::test]
async fn test_ledger_receives_unscaled_initial_supply() {
    let (chain, service) = make_service(true);
    service.run(&token_plan()).await.unwrap();

    let ledger_create = chain
        .calls()
        .into_iter()
        .find_map(|call| match call {
            RecordedCall::Create { kind, args, .. } if kind == "StableCoin" => Some(args),
            _ => None,
        })
        .unwrap();
    assert_eq!(ledger_create[2], Value::Uint(U256::from(1_000_000u64)));
}

#[tokio::test]
async fn test_one_distinct_address_per_component() {
    let (chain, service) = make_service(true);

    let report = service.run(&token_plan()).await.unwrap();
    let mut addresses: Vec<_> = report.resolved.iter().map(|(_, a)| a).collect();
    addresses.sort_by_key(|a| *a.as_bytes());
    addresses.dedup();
    assert_eq!(addresses.len(), 3);

    for record in &report.provisioned {
        assert_eq!(
            chain.component_kind(&record.address).as_deref(),
            Some(record.kind.as_str())
        );
    }
}

#[tokio::test]
async fn test_exemption_uses_deployer_and_limits_tuple() {
    let (chain, service) = make_service(true);
    service.run(&token_plan()).await.unwrap();

    let calls = confirmed_calls(&chain);
    let defaults = TokenDeployment::default();
    assert_eq!(calls[0].2[1], defaults.limits.to_value());
    assert_eq!(calls[1].1, "setExemption");
    assert_eq!(calls[1].2[1..], [Value::Address(deployer()), Value::Bool(true)]);
}

// =============================================================================
// PROVISIONING FAILURES
// =============================================================================

#[tokio::test]
async fn test_ledger_creation_rejected() {
    let (chain, service) = make_service(true);
    chain.inject(Fault::on_create("StableCoin").reject("constructor reverted"));

    let failure = service.run(&token_plan()).await.unwrap_err();

    assert_eq!(failure.position, PlanPosition::Component(2));
    assert_eq!(failure.entry, "ledger");
    assert_eq!(
        failure.error,
        DeployError::ProvisioningFailed {
            component: "ledger".into(),
            cause: FailureCause::Rejected {
                reason: "constructor reverted".into()
            },
        }
    );

    assert!(failure.report.resolved.contains(&"registry".into()));
    assert!(failure.report.resolved.contains(&"limiter".into()));
    assert!(!failure.report.resolved.contains(&"ledger".into()));
    assert!(failure.report.configured.is_empty());
    assert!(confirmed_calls(&chain).is_empty());
}

#[tokio::test]
async fn test_provisioning_timeout_not_retried() {
    init_tracing();
    let chain = Arc::new(InMemoryChain::new(deployer()));
    chain.inject(Fault::on_create("TransferLimiter").timeout().times(1));
    let retrying = RetryingPrimitive::new(Arc::clone(&chain), RetryPolicy::default());
    let service = DeploymentService::new(retrying, ServiceConfig::default());

    let failure = service.run(&token_plan()).await.unwrap_err();
    assert_eq!(failure.error.cause(), Some(&FailureCause::Timeout));
    assert!(!failure.error.is_retry_eligible());
    assert_eq!(failure.report.resolved.len(), 1);
    // registry create + failed limiter create
    assert_eq!(chain.call_count(), 2);
}

// =============================================================================
// UNRESOLVED REFERENCES
// =============================================================================

fn plan_with_ghost_step() -> DeploymentPlan {
    token_plan().step(
        ConfigurationStep::new("registry", "authorizeContract").arg(Argument::reference("ghost")),
    )
}

#[tokio::test]
async fn test_undeclared_reference_rejected_by_preflight() {
    let (chain, service) = make_service(true);

    let failure = service.run(&plan_with_ghost_step()).await.unwrap_err();
    assert_eq!(failure.position, PlanPosition::Step(4));
    assert_eq!(
        failure.error,
        DeployError::UnresolvedDependency {
            referenced: "ghost".into(),
            needed_by: "registry.authorizeContract".into(),
        }
    );
    assert_eq!(chain.call_count(), 0);
    assert!(failure.report.resolved.is_empty());
}

#[tokio::test]
async fn test_undeclared_reference_detected_at_point_of_use() {
    let (chain, service) = make_service(false);

    let failure = service.run(&plan_with_ghost_step()).await.unwrap_err();
    assert_eq!(failure.position, PlanPosition::Step(4));
    assert!(matches!(
        failure.error,
        DeployError::UnresolvedDependency { .. }
    ));
    // Everything before the step ran; the step itself issued nothing.
    assert_eq!(failure.report.configured.len(), 4);
    assert_eq!(chain.call_count(), 7);
}

#[tokio::test]
async fn test_forward_reference_without_preflight() {
    let (chain, service) = make_service(false);
    let plan = DeploymentPlan::new()
        .component(ComponentSpec::new("registry", "Whitelist").param("enabled", true))
        .component(
            ComponentSpec::new("ledger", "StableCoin")
                .param("name", Argument::String("Coin".into()))
                .param("symbol", Argument::String("C".into()))
                .param("supply", U256::from(1))
                .param("whitelist", Argument::reference("registry"))
                .param("limiter", Argument::reference("limiter")),
        )
        .component(ComponentSpec::new("limiter", "TransferLimiter"));

    let failure = service.run(&plan).await.unwrap_err();
    assert_eq!(failure.position, PlanPosition::Component(1));
    assert_eq!(
        failure.error,
        DeployError::UnresolvedDependency {
            referenced: "limiter".into(),
            needed_by: "ledger".into(),
        }
    );
    assert_eq!(failure.report.resolved.len(), 1);
    assert_eq!(chain.call_count(), 1);
}

#[tokio::test]
async fn test_type_mismatch_rejected_by_preflight() {
    let (chain, service) = make_service(true);
    let plan = token_plan().step(
        ConfigurationStep::new("limiter", "setExemption")
            .arg(Argument::reference("ledger"))
            .arg(Argument::reference("registry")),
    );

    let failure = service.run(&plan).await.unwrap_err();
    assert!(matches!(
        failure.error,
        DeployError::InvalidPlan(PlanError::ArityMismatch {
            expected: 3,
            actual: 2,
            ..
        })
    ));
    assert_eq!(chain.call_count(), 0);
}

// =============================================================================
// RE-EXECUTION AND RETRY
// =============================================================================

#[tokio::test]
async fn test_executing_a_step_twice_issues_two_calls() {
    let (chain, service) = make_service(true);
    let report = service.run(&token_plan()).await.unwrap();
    let before = chain.call_count();

    let step = ConfigurationStep::new("registry", "authorizeContract")
        .arg(Argument::reference("ledger"));
    service.execute(&step, &report.resolved).await.unwrap();
    service.execute(&step, &report.resolved).await.unwrap();

    assert_eq!(chain.call_count(), before + 2);
}

#[tokio::test(start_paused = true)]
async fn test_step_timeout_recovered_by_retry_decorator() {
    init_tracing();
    let chain = Arc::new(InMemoryChain::new(deployer()));
    chain.inject(Fault::on_call("setExemption").timeout().times(1));
    let retrying = RetryingPrimitive::new(Arc::clone(&chain), RetryPolicy::default());
    let service = DeploymentService::new(retrying, ServiceConfig::default());

    let report = service.run(&token_plan()).await.unwrap();
    assert_eq!(report.configured.len(), 4);
    assert_eq!(chain.call_count(), 8);
}

#[tokio::test]
async fn test_step_timeout_without_retry_halts() {
    let (chain, service) = make_service(true);
    chain.inject(Fault::on_call("authorizeContract").timeout());

    let failure = service.run(&token_plan()).await.unwrap_err();
    assert_eq!(failure.position, PlanPosition::Step(2));
    assert!(failure.error.is_retry_eligible());
    assert_eq!(failure.report.configured.len(), 2);
}

#[tokio::test]
async fn test_toml_plan_runs() {
    let (_, service) = make_service(true);
    let plan = TomlPlanLoader::parse(
        r#"
        [[component]]
        id = "registry"
        kind = "Whitelist"
        params = [{ name = "whitelistEnabled", value = { bool = false } }]

        [[component]]
        id = "limiter"
        kind = "TransferLimiter"

        [[step]]
        target = "registry"
        operation = "authorizeContract"
        args = [{ ref = "limiter" }]
        "#,
    )
    .unwrap();

    let report = service.run(&plan).await.unwrap();
    assert_eq!(report.resolved.len(), 2);
    assert_eq!(
        report.configured[0].args,
        vec![Value::Address(report.resolved.get(&"limiter".into()).unwrap())]
    );
}
