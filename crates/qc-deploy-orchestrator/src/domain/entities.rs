//! # Domain Entities
//!
//! The deployment plan, the resolution table it fills, and the records a run
//! produces.

use super::errors::DeployError;
use super::value_objects::{Address, Argument, ComponentId, Hash, Value};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// COMPONENT SPEC
// =============================================================================

/// A named constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorParam {
    /// Parameter name (informational, order is what matters).
    pub name: String,
    /// Literal value or reference to another component.
    pub value: Argument,
}

impl ConstructorParam {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<Argument>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Static description of one provisionable component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Identity inside the plan.
    pub id: ComponentId,
    /// Artifact name handed to `create` (e.g. `Whitelist`).
    pub kind: String,
    /// Human readable name for reports. Defaults to `kind`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Ordered constructor parameters.
    #[serde(default, rename = "params")]
    pub constructor_params: Vec<ConstructorParam>,
}

impl ComponentSpec {
    /// Creates a spec with no constructor parameters.
    pub fn new(id: impl Into<ComponentId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            display_name: None,
            constructor_params: Vec::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Appends a constructor parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.constructor_params.push(ConstructorParam::new(name, value));
        self
    }

    /// Name shown in reports.
    #[must_use]
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.kind)
    }

    /// Ids of the components whose addresses this spec needs.
    pub fn dependencies(&self) -> impl Iterator<Item = &ComponentId> {
        self.constructor_params
            .iter()
            .filter_map(|p| p.value.referenced())
    }
}

// =============================================================================
// CONFIGURATION STEP
// =============================================================================

/// A post-provisioning call against an already provisioned component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationStep {
    /// Component the call is sent to.
    pub target: ComponentId,
    /// Operation name on the target.
    pub operation: String,
    /// Ordered arguments.
    #[serde(default)]
    pub args: Vec<Argument>,
    /// Optional note printed with the step.
    #[serde(default)]
    pub description: Option<String>,
}

impl ConfigurationStep {
    /// Creates a step with no arguments.
    pub fn new(target: impl Into<ComponentId>, operation: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            operation: operation.into(),
            args: Vec::new(),
            description: None,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Argument>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `target.operation`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.target, self.operation)
    }

    /// Every component id this step needs: the target first, then argument
    /// references in order.
    pub fn references(&self) -> impl Iterator<Item = &ComponentId> {
        std::iter::once(&self.target).chain(self.args.iter().filter_map(Argument::referenced))
    }
}

// =============================================================================
// DEPLOYMENT PLAN
// =============================================================================

/// Position of an entry inside a plan, zero-based within its phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "phase", content = "index", rename_all = "snake_case")]
pub enum PlanPosition {
    /// Index into `DeploymentPlan::components`.
    Component(usize),
    /// Index into `DeploymentPlan::steps`.
    Step(usize),
}

impl fmt::Display for PlanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(i) => write!(f, "component #{}", i + 1),
            Self::Step(i) => write!(f, "step #{}", i + 1),
        }
    }
}

/// Ordered components followed by ordered configuration steps.
///
/// Plan order must already be a valid topological order: the orchestrator
/// never reorders entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Components, provisioned in this order.
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentSpec>,
    /// Configuration steps, executed in this order after all components.
    #[serde(default, rename = "step")]
    pub steps: Vec<ConfigurationStep>,
}

impl DeploymentPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component.
    #[must_use]
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.components.push(spec);
        self
    }

    /// Appends a configuration step.
    #[must_use]
    pub fn step(mut self, step: ConfigurationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Looks up a component spec by id.
    #[must_use]
    pub fn spec(&self, id: &ComponentId) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| &c.id == id)
    }

    /// Label of the entry at `position` (component id or `target.operation`).
    #[must_use]
    pub fn entry_label(&self, position: PlanPosition) -> Option<String> {
        match position {
            PlanPosition::Component(i) => self.components.get(i).map(|c| c.id.to_string()),
            PlanPosition::Step(i) => self.steps.get(i).map(ConfigurationStep::label),
        }
    }

    /// Total number of external calls a successful run issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len() + self.steps.len()
    }

    /// Returns true if the plan has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.steps.is_empty()
    }
}

// =============================================================================
// RESOLUTION TABLE
// =============================================================================

/// The run's accumulating map from component id to provisioned address.
///
/// Write-once per id and ordered by insertion, so reports list components in
/// the order they went live.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionTable {
    entries: Vec<(ComponentId, Address)>,
}

impl ResolutionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the address of a freshly provisioned component.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` if the id already has an address.
    pub fn insert(&mut self, id: ComponentId, address: Address) -> Result<(), DeployError> {
        if self.contains(&id) {
            return Err(DeployError::AlreadyResolved { component: id });
        }
        self.entries.push((id, address));
        Ok(())
    }

    /// Address of `id`, if resolved.
    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<Address> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, address)| *address)
    }

    /// Address of `id`, or `UnresolvedDependency` naming the entry that
    /// needed it.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedDependency` if `id` has no entry.
    pub fn require(&self, id: &ComponentId, needed_by: &str) -> Result<Address, DeployError> {
        self.get(id).ok_or_else(|| DeployError::UnresolvedDependency {
            referenced: id.clone(),
            needed_by: needed_by.to_string(),
        })
    }

    /// Returns true if `id` is resolved.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.entries.iter().any(|(entry, _)| entry == id)
    }

    /// Number of resolved components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, Address)> {
        self.entries.iter().map(|(id, address)| (id, *address))
    }

    /// Resolved ids in resolution order.
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

impl Serialize for ResolutionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(id, address)| (id, address)))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Proof that the external system included a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    /// Transaction hash.
    pub tx_hash: Hash,
    /// Block the transaction was included in.
    pub block_number: u64,
}

/// A confirmed component creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisionRecord {
    /// Component id.
    pub component: ComponentId,
    /// Artifact kind.
    pub kind: String,
    /// New address.
    pub address: Address,
    /// Inclusion proof.
    pub confirmation: Confirmation,
}

/// A confirmed configuration call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Target component id.
    pub target: ComponentId,
    /// Operation name.
    pub operation: String,
    /// Resolved target address.
    pub target_address: Address,
    /// Arguments as sent, references substituted.
    pub args: Vec<Value>,
    /// Inclusion proof.
    pub confirmation: Confirmation,
}

/// Everything a run confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    /// Unique id of this run, for correlating logs.
    pub run_id: Uuid,
    /// Resolved addresses in provisioning order.
    pub resolved: ResolutionTable,
    /// Confirmed creations in plan order.
    pub provisioned: Vec<ProvisionRecord>,
    /// Confirmed configuration calls in plan order.
    pub configured: Vec<StepRecord>,
}

impl DeploymentReport {
    /// Creates an empty report for a new run.
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            resolved: ResolutionTable::new(),
            provisioned: Vec::new(),
            configured: Vec::new(),
        }
    }

    /// Number of confirmed external calls.
    #[must_use]
    pub fn calls_confirmed(&self) -> usize {
        self.provisioned.len() + self.configured.len()
    }
}

/// A run that stopped before reaching the fully configured state.
///
/// `report` holds every call that did confirm; the components it lists are
/// live on the external system and need manual attention.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("deployment halted at {position} ({entry}): {error}")]
pub struct DeploymentFailure {
    /// Partial report.
    pub report: DeploymentReport,
    /// Failing entry.
    pub position: PlanPosition,
    /// Component id or `target.operation` of the failing entry.
    pub entry: String,
    /// What went wrong.
    pub error: DeployError,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::U256;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_resolution_table_write_once() {
        let mut table = ResolutionTable::new();
        table.insert("registry".into(), addr(1)).unwrap();

        let err = table.insert("registry".into(), addr(2)).unwrap_err();
        assert_eq!(
            err,
            DeployError::AlreadyResolved {
                component: "registry".into()
            }
        );
        assert_eq!(table.get(&"registry".into()), Some(addr(1)));
    }

    #[test]
    fn test_resolution_table_keeps_order() {
        let mut table = ResolutionTable::new();
        table.insert("b".into(), addr(2)).unwrap();
        table.insert("a".into(), addr(1)).unwrap();

        let ids: Vec<_> = table.ids().map(ComponentId::as_str).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn test_require_names_the_dependent() {
        let table = ResolutionTable::new();
        let err = table.require(&"ledger".into(), "limiter.authorizeContract");
        assert_eq!(
            err,
            Err(DeployError::UnresolvedDependency {
                referenced: "ledger".into(),
                needed_by: "limiter.authorizeContract".into(),
            })
        );
    }

    #[test]
    fn test_spec_dependencies() {
        let spec = ComponentSpec::new("ledger", "StableCoin")
            .param("name", Argument::String("Coin".into()))
            .param("supply", U256::from(1))
            .param("whitelist", Argument::reference("registry"))
            .param("limiter", Argument::reference("limiter"));

        let deps: Vec<_> = spec.dependencies().map(ComponentId::as_str).collect();
        assert_eq!(deps, vec!["registry", "limiter"]);
        assert_eq!(spec.display(), "StableCoin");
    }

    #[test]
    fn test_step_references_start_with_target() {
        let step = ConfigurationStep::new("limiter", "setExemption")
            .arg(Argument::reference("ledger"))
            .arg(addr(7))
            .arg(true);

        let refs: Vec<_> = step.references().map(ComponentId::as_str).collect();
        assert_eq!(refs, vec!["limiter", "ledger"]);
        assert_eq!(step.label(), "limiter.setExemption");
    }

    #[test]
    fn test_plan_entry_label() {
        let plan = DeploymentPlan::new()
            .component(ComponentSpec::new("registry", "Whitelist"))
            .step(ConfigurationStep::new("registry", "authorizeContract"));

        assert_eq!(
            plan.entry_label(PlanPosition::Component(0)).as_deref(),
            Some("registry")
        );
        assert_eq!(
            plan.entry_label(PlanPosition::Step(0)).as_deref(),
            Some("registry.authorizeContract")
        );
        assert_eq!(plan.entry_label(PlanPosition::Step(3)), None);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_position_display_is_one_based() {
        assert_eq!(PlanPosition::Component(2).to_string(), "component #3");
        assert_eq!(PlanPosition::Step(0).to_string(), "step #1");
    }
}
