//! # Adapters Layer (Hexagonal Architecture)
//!
//! Execution primitives and plan input.

mod in_memory_chain;
mod plan_file;
mod retry;

pub use in_memory_chain::{Fault, FaultKind, FaultTarget, InMemoryChain, RecordedCall};
pub use plan_file::{PlanLoadError, TomlPlanLoader};
pub use retry::{RetryPolicy, RetryingPrimitive};
