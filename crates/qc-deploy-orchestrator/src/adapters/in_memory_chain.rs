//! In-Memory Chain Adapter
//!
//! Implements `ExecutionPrimitive` against a simulated chain: addresses are
//! derived from the deployer and its nonce, every call mines one block, and
//! faults can be injected per kind or operation.

use crate::domain::{
    compute_component_address, keccak256, Address, Confirmation, ExecutionError, Value,
};
use crate::ports::outbound::ExecutionPrimitive;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// One call as the chain saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    /// A `create` attempt.
    Create {
        /// Artifact kind.
        kind: String,
        /// Constructor arguments.
        args: Vec<Value>,
        /// Address assigned, if the creation confirmed.
        address: Option<Address>,
    },
    /// A `call` attempt.
    Call {
        /// Target address.
        target: Address,
        /// Operation name.
        operation: String,
        /// Arguments.
        args: Vec<Value>,
        /// Whether the call confirmed.
        confirmed: bool,
    },
}

impl RecordedCall {
    /// Returns true if the call confirmed.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        match self {
            Self::Create { address, .. } => address.is_some(),
            Self::Call { confirmed, .. } => *confirmed,
        }
    }
}

/// Which calls a fault applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultTarget {
    /// `create` of this kind.
    Create(String),
    /// `call` of this operation on any component.
    Call(String),
}

/// What an injected fault does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// Reject with a revert reason.
    Reject(String),
    /// Report a confirmation timeout.
    Timeout,
    /// Report a transport failure.
    Transport(String),
}

/// An injected failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    target: FaultTarget,
    kind: FaultKind,
    remaining: Option<usize>,
}

impl Fault {
    /// Fault on `create` of `kind`. Rejects until changed.
    pub fn on_create(kind: impl Into<String>) -> Self {
        Self {
            target: FaultTarget::Create(kind.into()),
            kind: FaultKind::Reject("execution reverted".to_string()),
            remaining: None,
        }
    }

    /// Fault on `call` of `operation`. Rejects until changed.
    pub fn on_call(operation: impl Into<String>) -> Self {
        Self {
            target: FaultTarget::Call(operation.into()),
            kind: FaultKind::Reject("execution reverted".to_string()),
            remaining: None,
        }
    }

    /// Rejects with `reason`.
    #[must_use]
    pub fn reject(mut self, reason: impl Into<String>) -> Self {
        self.kind = FaultKind::Reject(reason.into());
        self
    }

    /// Times out instead of rejecting.
    #[must_use]
    pub fn timeout(mut self) -> Self {
        self.kind = FaultKind::Timeout;
        self
    }

    /// Fails at the transport layer.
    #[must_use]
    pub fn transport(mut self, detail: impl Into<String>) -> Self {
        self.kind = FaultKind::Transport(detail.into());
        self
    }

    /// Fires only for the next `n` matching calls.
    #[must_use]
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    fn matches(&self, target: &FaultTarget) -> bool {
        &self.target == target && self.remaining != Some(0)
    }
}

#[derive(Default)]
struct ChainState {
    nonce: u64,
    block_number: u64,
    components: HashMap<Address, String>,
    log: Vec<RecordedCall>,
    faults: Vec<Fault>,
}

impl ChainState {
    /// Returns the error of the first live fault matching `target`.
    fn take_fault(&mut self, target: &FaultTarget, timeout_ms: u64) -> Option<ExecutionError> {
        let fault = self.faults.iter_mut().find(|f| f.matches(target))?;
        if let Some(remaining) = fault.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(match &fault.kind {
            FaultKind::Reject(reason) => ExecutionError::Rejected {
                reason: reason.clone(),
            },
            FaultKind::Timeout => ExecutionError::Timeout {
                waited_ms: timeout_ms,
            },
            FaultKind::Transport(detail) => ExecutionError::Transport(detail.clone()),
        })
    }

    /// Consumes a nonce and mines a block.
    fn confirm(&mut self, sender: Address, payload: &str) -> (u64, Confirmation) {
        let nonce = self.nonce;
        self.nonce += 1;
        self.block_number += 1;

        let mut preimage = Vec::with_capacity(28 + payload.len());
        preimage.extend_from_slice(sender.as_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(payload.as_bytes());

        let confirmation = Confirmation {
            tx_hash: keccak256(&preimage),
            block_number: self.block_number,
        };
        (nonce, confirmation)
    }
}

/// Simulated chain for dry runs and tests.
pub struct InMemoryChain {
    deployer: Address,
    state: Mutex<ChainState>,
    confirmation_delay: Option<Duration>,
    timeout_ms: u64,
}

impl InMemoryChain {
    /// Chain where every call comes from `deployer`.
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            state: Mutex::new(ChainState::default()),
            confirmation_delay: None,
            timeout_ms: 30_000,
        }
    }

    /// Waits `delay` before confirming each call.
    #[must_use]
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = Some(delay);
        self
    }

    /// Wait reported by injected timeouts.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Adds a fault. Faults are checked in insertion order.
    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.push(fault);
    }

    /// Every attempt, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().log.clone()
    }

    /// Number of attempts (confirmed or not).
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Kind of the component at `address`, if one was created there.
    #[must_use]
    pub fn component_kind(&self, address: &Address) -> Option<String> {
        self.state.lock().components.get(address).cloned()
    }

    async fn settle(&self) {
        if let Some(delay) = self.confirmation_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ExecutionPrimitive for InMemoryChain {
    async fn create(
        &self,
        kind: &str,
        args: &[Value],
    ) -> Result<(Address, Confirmation), ExecutionError> {
        self.settle().await;

        let mut state = self.state.lock();
        if let Some(err) = state.take_fault(&FaultTarget::Create(kind.to_string()), self.timeout_ms) {
            warn!("[qc-deploy] create {} failed: {}", kind, err);
            state.log.push(RecordedCall::Create {
                kind: kind.to_string(),
                args: args.to_vec(),
                address: None,
            });
            return Err(err);
        }

        let (nonce, confirmation) = state.confirm(self.deployer, kind);
        let address = compute_component_address(self.deployer, nonce);
        state.components.insert(address, kind.to_string());
        state.log.push(RecordedCall::Create {
            kind: kind.to_string(),
            args: args.to_vec(),
            address: Some(address),
        });

        debug!(
            "[qc-deploy] Created {} at {} (block {})",
            kind, address, confirmation.block_number
        );
        Ok((address, confirmation))
    }

    async fn call(
        &self,
        target: Address,
        operation: &str,
        args: &[Value],
    ) -> Result<Confirmation, ExecutionError> {
        self.settle().await;

        let mut state = self.state.lock();
        let fault = if state.components.contains_key(&target) {
            state.take_fault(&FaultTarget::Call(operation.to_string()), self.timeout_ms)
        } else {
            Some(ExecutionError::NoComponent { address: target })
        };

        state.log.push(RecordedCall::Call {
            target,
            operation: operation.to_string(),
            args: args.to_vec(),
            confirmed: fault.is_none(),
        });
        if let Some(err) = fault {
            warn!("[qc-deploy] {} on {} failed: {}", operation, target, err);
            return Err(err);
        }

        let (_, confirmation) = state.confirm(self.deployer, operation);
        debug!(
            "[qc-deploy] {} on {} confirmed (block {})",
            operation, target, confirmation.block_number
        );
        Ok(confirmation)
    }

    fn caller(&self) -> Address {
        self.deployer
    }
}
