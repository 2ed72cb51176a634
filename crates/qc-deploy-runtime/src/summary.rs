//! # Run Summary
//!
//! Human-readable summaries and the JSON address book written after a run.

use anyhow::{Context, Result};
use qc_deploy_orchestrator::domain::{
    Address, Argument, ComponentSpec, DeploymentFailure, DeploymentPlan, DeploymentReport,
    ResolutionTable,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Renders the summary of a fully configured run.
#[must_use]
pub fn render_success(report: &DeploymentReport, plan: &DeploymentPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Deployment Summary");
    let _ = writeln!(out, "==================");
    let _ = writeln!(out, "Run: {}", report.run_id);
    render_components(&mut out, &report.resolved, plan);
    let _ = writeln!(
        out,
        "Configuration: {} of {} steps confirmed",
        report.configured.len(),
        plan.steps.len()
    );
    out
}

/// Renders the summary of a halted run.
///
/// Lists every live component, since none of them were rolled back.
#[must_use]
pub fn render_failure(failure: &DeploymentFailure, plan: &DeploymentPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Deployment FAILED at {} ({})",
        failure.position, failure.entry
    );
    let _ = writeln!(out, "Error: {}", failure.error);
    if let Some(cause) = failure.error.cause() {
        let _ = writeln!(out, "Cause: {}", cause.label());
    }
    if let Some(address) = failure.error.cause().and_then(|c| c.stale_address()) {
        let _ = writeln!(
            out,
            "Stale address: nothing is deployed at {address}; the resolved table is wrong and the run cannot continue."
        );
    }
    if failure.error.is_retry_eligible() {
        let _ = writeln!(out, "The failure is transient; re-running the step may succeed.");
    }

    if failure.report.resolved.is_empty() {
        let _ = writeln!(out, "No components were deployed.");
    } else {
        let _ = writeln!(out, "Live components needing manual attention:");
        render_components(&mut out, &failure.report.resolved, plan);
    }
    let _ = writeln!(
        out,
        "Configuration: {} of {} steps confirmed",
        failure.report.configured.len(),
        plan.steps.len()
    );
    out
}

fn render_components(out: &mut String, resolved: &ResolutionTable, plan: &DeploymentPlan) {
    for (id, address) in resolved.iter() {
        let spec = plan.spec(id);
        let name = spec.map_or(id.as_str(), |spec| spec.display());
        match spec.and_then(token_symbol) {
            Some(symbol) => {
                let _ = writeln!(out, "  {name} ({id}): {address} ({symbol})");
            }
            None => {
                let _ = writeln!(out, "  {name} ({id}): {address}");
            }
        }
    }
}

/// Symbol of a token ledger, read from its `symbol` constructor parameter.
fn token_symbol(spec: &ComponentSpec) -> Option<&str> {
    spec.constructor_params
        .iter()
        .find(|param| param.name == "symbol")
        .and_then(|param| match &param.value {
            Argument::String(symbol) => Some(symbol.as_str()),
            _ => None,
        })
}

/// Outcome of a run as recorded in the address book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every component and step confirmed.
    Complete,
    /// The run stopped at a failure.
    Halted,
}

/// JSON record of the addresses a run produced.
#[derive(Debug, Serialize)]
pub struct AddressBook<'a> {
    /// Run id for correlating with logs.
    pub run_id: String,
    /// Network the run targeted.
    pub network: &'static str,
    /// Deploying account.
    pub deployer: Address,
    /// RFC 3339 timestamp of the run start.
    pub started_at: String,
    /// Outcome.
    pub status: RunStatus,
    /// Failing entry, if halted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
    /// Failure message, if halted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Component id to address, in deployment order.
    pub components: &'a ResolutionTable,
}

impl<'a> AddressBook<'a> {
    /// Address book of a complete run.
    pub fn complete(report: &'a DeploymentReport, deployer: Address, started_at: String) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            network: "in-memory",
            deployer,
            started_at,
            status: RunStatus::Complete,
            failed_at: None,
            error: None,
            components: &report.resolved,
        }
    }

    /// Address book of a halted run.
    pub fn halted(failure: &'a DeploymentFailure, deployer: Address, started_at: String) -> Self {
        Self {
            run_id: failure.report.run_id.to_string(),
            network: "in-memory",
            deployer,
            started_at,
            status: RunStatus::Halted,
            failed_at: Some(format!("{} ({})", failure.position, failure.entry)),
            error: Some(failure.error.to_string()),
            components: &failure.report.resolved,
        }
    }

    /// Writes the address book as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize address book")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write address book to {}", path.display()))
    }
}
