//! # Domain Invariants
//!
//! Static rules a plan must satisfy before any external call is issued.
//!
//! Every check is pure and looks only at the plan (and the catalog for
//! typing). Checks run in a fixed order so the first reported problem is
//! stable across runs.

use super::catalog::ComponentCatalog;
use super::entities::{DeploymentPlan, PlanPosition};
use super::errors::{DeployError, PlanError};
use super::value_objects::ComponentId;
use std::collections::{HashMap, HashSet};

/// Runs every plan invariant in order.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_plan(plan: &DeploymentPlan, catalog: &ComponentCatalog) -> Result<(), PlanError> {
    invariant_non_empty_names(plan)?;
    invariant_unique_ids(plan)?;
    invariant_no_self_reference(plan)?;
    invariant_acyclic(plan)?;
    invariant_references_declared_earlier(plan)?;
    invariant_step_references_declared(plan)?;
    invariant_well_typed(plan, catalog)
}

/// Maps a plan error onto the error the orchestrator reports.
///
/// Unknown and forward references surface as `UnresolvedDependency` naming
/// the entry that needed them, the same error a run without pre-flight would
/// hit at the point of use. Everything else is `InvalidPlan`.
#[must_use]
pub fn into_deploy_error(err: PlanError, plan: &DeploymentPlan) -> DeployError {
    match err {
        PlanError::UnknownReference {
            referenced,
            position,
        }
        | PlanError::ForwardReference {
            referenced,
            position,
        } => DeployError::UnresolvedDependency {
            referenced,
            needed_by: plan
                .entry_label(position)
                .unwrap_or_else(|| position.to_string()),
        },
        other => DeployError::InvalidPlan(other),
    }
}

/// Invariant: every component has a kind and every step an operation.
pub fn invariant_non_empty_names(plan: &DeploymentPlan) -> Result<(), PlanError> {
    for (i, spec) in plan.components.iter().enumerate() {
        if spec.kind.trim().is_empty() {
            return Err(PlanError::EmptyKind {
                component: spec.id.clone(),
                position: PlanPosition::Component(i),
            });
        }
    }
    for (i, step) in plan.steps.iter().enumerate() {
        if step.operation.trim().is_empty() {
            return Err(PlanError::EmptyOperation {
                position: PlanPosition::Step(i),
            });
        }
    }
    Ok(())
}

/// Invariant: component ids are unique within a plan.
pub fn invariant_unique_ids(plan: &DeploymentPlan) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    for (i, spec) in plan.components.iter().enumerate() {
        if !seen.insert(&spec.id) {
            return Err(PlanError::DuplicateComponent {
                component: spec.id.clone(),
                position: PlanPosition::Component(i),
            });
        }
    }
    Ok(())
}

/// Invariant: no component passes its own address to its constructor.
pub fn invariant_no_self_reference(plan: &DeploymentPlan) -> Result<(), PlanError> {
    for (i, spec) in plan.components.iter().enumerate() {
        if spec.dependencies().any(|dep| dep == &spec.id) {
            return Err(PlanError::SelfReference {
                component: spec.id.clone(),
                position: PlanPosition::Component(i),
            });
        }
    }
    Ok(())
}

/// Invariant: the component dependency graph has no cycles.
///
/// Self edges and undeclared ids are left to their own invariants.
pub fn invariant_acyclic(plan: &DeploymentPlan) -> Result<(), PlanError> {
    let index: HashMap<&ComponentId, usize> = plan
        .components
        .iter()
        .enumerate()
        .map(|(i, spec)| (&spec.id, i))
        .collect();

    let adjacency: Vec<Vec<usize>> = plan
        .components
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            spec.dependencies()
                .filter_map(|dep| index.get(dep).copied())
                .filter(|&j| j != i)
                .collect()
        })
        .collect();

    fn dfs(
        node: usize,
        adjacency: &[Vec<usize>],
        stack: &mut Vec<usize>,
        visited: &mut [bool],
    ) -> Option<Vec<usize>> {
        if let Some(start) = stack.iter().position(|&n| n == node) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        if visited[node] {
            return None;
        }

        stack.push(node);
        for &next in &adjacency[node] {
            if let Some(cycle) = dfs(next, adjacency, stack, visited) {
                return Some(cycle);
            }
        }
        stack.pop();
        visited[node] = true;
        None
    }

    let mut visited = vec![false; plan.components.len()];
    for node in 0..plan.components.len() {
        if visited[node] {
            continue;
        }
        let mut stack = Vec::new();
        if let Some(cycle) = dfs(node, &adjacency, &mut stack, &mut visited) {
            let first = cycle[0];
            return Err(PlanError::CycleDetected {
                path: cycle
                    .into_iter()
                    .map(|n| plan.components[n].id.clone())
                    .collect(),
                position: PlanPosition::Component(first),
            });
        }
    }
    Ok(())
}

/// Invariant: constructor references name components declared earlier.
pub fn invariant_references_declared_earlier(plan: &DeploymentPlan) -> Result<(), PlanError> {
    let declared: HashSet<&ComponentId> = plan.components.iter().map(|c| &c.id).collect();
    let mut provisioned = HashSet::new();

    for (i, spec) in plan.components.iter().enumerate() {
        let position = PlanPosition::Component(i);
        for dep in spec.dependencies() {
            if provisioned.contains(dep) {
                continue;
            }
            return Err(if declared.contains(dep) {
                PlanError::ForwardReference {
                    referenced: dep.clone(),
                    position,
                }
            } else {
                PlanError::UnknownReference {
                    referenced: dep.clone(),
                    position,
                }
            });
        }
        provisioned.insert(&spec.id);
    }
    Ok(())
}

/// Invariant: step targets and argument references name declared
/// components.
///
/// Steps run after every component is provisioned, so declaration order does
/// not matter here.
pub fn invariant_step_references_declared(plan: &DeploymentPlan) -> Result<(), PlanError> {
    let declared: HashSet<&ComponentId> = plan.components.iter().map(|c| &c.id).collect();

    for (i, step) in plan.steps.iter().enumerate() {
        if let Some(missing) = step.references().find(|id| !declared.contains(id)) {
            return Err(PlanError::UnknownReference {
                referenced: missing.clone(),
                position: PlanPosition::Step(i),
            });
        }
    }
    Ok(())
}

/// Invariant: constructors and steps match the catalog's signatures.
pub fn invariant_well_typed(
    plan: &DeploymentPlan,
    catalog: &ComponentCatalog,
) -> Result<(), PlanError> {
    for (i, spec) in plan.components.iter().enumerate() {
        catalog.check_constructor(spec, PlanPosition::Component(i))?;
    }
    for (i, step) in plan.steps.iter().enumerate() {
        if let Some(target) = plan.spec(&step.target) {
            catalog.check_step(&target.kind, step, PlanPosition::Step(i))?;
        }
    }
    Ok(())
}
