//! # Outbound Ports
//!
//! The execution primitive: the only way the orchestrator touches the
//! external system. Signing, fee estimation, submission and waiting for
//! confirmation all live behind it.

use crate::domain::{Address, Confirmation, ExecutionError, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// Creates components and calls operations on them.
///
/// Every method returns only once the call is confirmed or has definitely
/// failed. Implementations apply their own timeouts and report them as
/// [`ExecutionError::Timeout`].
#[async_trait]
pub trait ExecutionPrimitive: Send + Sync {
    /// Creates a component of `kind` with resolved constructor arguments.
    async fn create(
        &self,
        kind: &str,
        args: &[Value],
    ) -> Result<(Address, Confirmation), ExecutionError>;

    /// Calls `operation` on the component at `target`.
    async fn call(
        &self,
        target: Address,
        operation: &str,
        args: &[Value],
    ) -> Result<Confirmation, ExecutionError>;

    /// Identity the calls are issued from.
    fn caller(&self) -> Address;
}

#[async_trait]
impl<T: ExecutionPrimitive + ?Sized> ExecutionPrimitive for Arc<T> {
    async fn create(
        &self,
        kind: &str,
        args: &[Value],
    ) -> Result<(Address, Confirmation), ExecutionError> {
        (**self).create(kind, args).await
    }

    async fn call(
        &self,
        target: Address,
        operation: &str,
        args: &[Value],
    ) -> Result<Confirmation, ExecutionError> {
        (**self).call(target, operation, args).await
    }

    fn caller(&self) -> Address {
        (**self).caller()
    }
}
