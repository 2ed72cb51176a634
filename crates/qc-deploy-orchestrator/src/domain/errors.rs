//! # Domain Errors
//!
//! Error types for deployment orchestration.
//!
//! `UnresolvedDependency` and `InvalidPlan` are plan errors: the plan is
//! malformed and the run must be fixed, not retried. `ProvisioningFailed` and
//! `ConfigurationFailed` come from the external system and carry a
//! [`FailureCause`].

use super::entities::PlanPosition;
use super::value_objects::{Address, ComponentId};
use thiserror::Error;

// =============================================================================
// FAILURE CAUSE
// =============================================================================

/// Why an external call did not confirm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The external system rejected the call (revert, bad address, ...).
    #[error("rejected: {reason}")]
    Rejected {
        /// Reason reported by the external system.
        reason: String,
    },

    /// The call targeted an address with no deployed component. A rejection
    /// caused by a stale or wrong resolved address, fatal for the run.
    #[error("rejected: no component deployed at {address}")]
    StaleAddress {
        /// Address that was called.
        address: Address,
    },

    /// No confirmation arrived in time.
    #[error("timeout")]
    Timeout,

    /// Anything the external system could not classify.
    #[error("unknown: {detail}")]
    Unknown {
        /// Raw detail from the transport.
        detail: String,
    },
}

impl FailureCause {
    /// Short label used in reports (`Rejected`, `Timeout`, `Unknown`).
    ///
    /// A stale address is a kind of rejection and shares its label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected { .. } | Self::StaleAddress { .. } => "Rejected",
            Self::Timeout => "Timeout",
            Self::Unknown { .. } => "Unknown",
        }
    }

    /// Address with no deployed component, if that caused the rejection.
    #[must_use]
    pub fn stale_address(&self) -> Option<Address> {
        match self {
            Self::StaleAddress { address } => Some(*address),
            _ => None,
        }
    }
}

// =============================================================================
// EXECUTION ERRORS (from the execution primitive)
// =============================================================================

/// Errors reported by an [`ExecutionPrimitive`](crate::ports::ExecutionPrimitive).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The call was included but rejected.
    #[error("call rejected: {reason}")]
    Rejected {
        /// Revert reason.
        reason: String,
    },

    /// The target address holds no component (stale or wrong address).
    #[error("no component deployed at {address}")]
    NoComponent {
        /// Address that was called.
        address: Address,
    },

    /// Confirmation did not arrive in time.
    #[error("confirmation timeout after {waited_ms}ms")]
    Timeout {
        /// How long the primitive waited.
        waited_ms: u64,
    },

    /// Transport failure with unknown outcome.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ExecutionError {
    /// Returns true if the call may succeed when issued again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<ExecutionError> for FailureCause {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Rejected { reason } => FailureCause::Rejected { reason },
            ExecutionError::NoComponent { address } => FailureCause::StaleAddress { address },
            ExecutionError::Timeout { .. } => FailureCause::Timeout,
            ExecutionError::Transport(detail) => FailureCause::Unknown { detail },
        }
    }
}

// =============================================================================
// PLAN ERRORS (static validation)
// =============================================================================

/// Structural problems found by pre-flight validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Two components share an id.
    #[error("duplicate component id {component} at {position}")]
    DuplicateComponent {
        /// Duplicated id.
        component: ComponentId,
        /// Position of the second declaration.
        position: PlanPosition,
    },

    /// A reference names an id that is never declared.
    #[error("{position} references undeclared component {referenced}")]
    UnknownReference {
        /// Undeclared id.
        referenced: ComponentId,
        /// Where the reference appears.
        position: PlanPosition,
    },

    /// A component references one declared after it.
    #[error("{position} references {referenced} before it is provisioned")]
    ForwardReference {
        /// Id declared later in the plan.
        referenced: ComponentId,
        /// Where the reference appears.
        position: PlanPosition,
    },

    /// A component references its own address.
    #[error("component {component} references itself")]
    SelfReference {
        /// Offending component.
        component: ComponentId,
        /// Its declaration.
        position: PlanPosition,
    },

    /// Component dependencies form a cycle.
    #[error("dependency cycle: {}", format_path(.path))]
    CycleDetected {
        /// Ids along the cycle, first id repeated at the end.
        path: Vec<ComponentId>,
        /// Declaration of the first id on the path.
        position: PlanPosition,
    },

    /// A component has no kind to create.
    #[error("component {component} has an empty kind")]
    EmptyKind {
        /// Offending component.
        component: ComponentId,
        /// Its declaration.
        position: PlanPosition,
    },

    /// A step has no operation name.
    #[error("{position} has an empty operation name")]
    EmptyOperation {
        /// Offending step.
        position: PlanPosition,
    },

    /// Operation is not part of the target kind's interface.
    #[error("{position}: {kind} has no operation {operation}")]
    UnknownOperation {
        /// Offending step.
        position: PlanPosition,
        /// Target component kind.
        kind: String,
        /// Requested operation.
        operation: String,
    },

    /// Wrong number of arguments for a known signature.
    #[error("{position}: {signature} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Offending entry.
        position: PlanPosition,
        /// `Kind.operation` or `Kind(constructor)`.
        signature: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// Argument type does not match a known signature.
    #[error("{position}: {signature} argument #{index} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Offending entry.
        position: PlanPosition,
        /// `Kind.operation` or `Kind(constructor)`.
        signature: String,
        /// Zero-based argument index.
        index: usize,
        /// Declared type.
        expected: String,
        /// Supplied type.
        actual: String,
    },
}

impl PlanError {
    /// Plan entry the problem was found at.
    #[must_use]
    pub fn position(&self) -> PlanPosition {
        match self {
            Self::DuplicateComponent { position, .. }
            | Self::UnknownReference { position, .. }
            | Self::ForwardReference { position, .. }
            | Self::SelfReference { position, .. }
            | Self::CycleDetected { position, .. }
            | Self::EmptyKind { position, .. }
            | Self::EmptyOperation { position }
            | Self::UnknownOperation { position, .. }
            | Self::ArityMismatch { position, .. }
            | Self::TypeMismatch { position, .. } => *position,
        }
    }
}

fn format_path(path: &[ComponentId]) -> String {
    path.iter()
        .map(ComponentId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// =============================================================================
// DEPLOY ERRORS
// =============================================================================

/// Errors surfaced by the provisioner, the step executor and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// A referenced component has no resolved address at the point of use.
    #[error("unresolved dependency {referenced} needed by {needed_by}")]
    UnresolvedDependency {
        /// Missing id.
        referenced: ComponentId,
        /// Component id or `target.operation` that needed it.
        needed_by: String,
    },

    /// Creating a component failed.
    #[error("provisioning {component} failed: {cause}")]
    ProvisioningFailed {
        /// Component being created.
        component: ComponentId,
        /// External cause.
        cause: FailureCause,
    },

    /// A configuration call failed.
    #[error("configuration {target}.{operation} failed: {cause}")]
    ConfigurationFailed {
        /// Component the call targeted.
        target: ComponentId,
        /// Operation name.
        operation: String,
        /// External cause.
        cause: FailureCause,
    },

    /// A component id was resolved twice.
    #[error("component {component} is already resolved")]
    AlreadyResolved {
        /// Duplicated id.
        component: ComponentId,
    },

    /// Pre-flight validation rejected the plan.
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),
}

impl DeployError {
    /// Returns true if the plan itself is wrong (fatal, never retry).
    #[must_use]
    pub fn is_plan_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedDependency { .. } | Self::AlreadyResolved { .. } | Self::InvalidPlan(_)
        )
    }

    /// Returns true if the failure is transient and a bounded retry policy
    /// may re-issue the call.
    ///
    /// Provisioning is never eligible: creating again yields a new address.
    #[must_use]
    pub fn is_retry_eligible(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationFailed {
                cause: FailureCause::Timeout,
                ..
            }
        )
    }

    /// Returns true if a call hit an address with no component. The resolved
    /// table is wrong, so the run must not continue or retry.
    #[must_use]
    pub fn is_stale_address(&self) -> bool {
        self.cause()
            .and_then(FailureCause::stale_address)
            .is_some()
    }

    /// External cause, if the error came from the execution primitive.
    #[must_use]
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::ProvisioningFailed { cause, .. } | Self::ConfigurationFailed { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
