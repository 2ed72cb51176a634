//! Retry decorator with exponential backoff.
//!
//! Re-issues configuration calls that timed out. Creation is never retried:
//! a second `create` would produce a second component at a new address.
//! Rejections and transport errors are returned as-is.

use crate::domain::{Address, Confirmation, ExecutionError, Value};
use crate::ports::outbound::ExecutionPrimitive;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Retry policy for timed-out calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `step + 1`: `initial_delay * 2^step`, capped.
    #[must_use]
    pub fn delay(&self, step: u32) -> Duration {
        let factor = 2u32.saturating_pow(step);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Wraps a primitive and retries `call` on timeout.
pub struct RetryingPrimitive<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: ExecutionPrimitive> RetryingPrimitive<E> {
    /// Wraps `inner`.
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Active policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl<E: ExecutionPrimitive> ExecutionPrimitive for RetryingPrimitive<E> {
    async fn create(
        &self,
        kind: &str,
        args: &[Value],
    ) -> Result<(Address, Confirmation), ExecutionError> {
        self.inner.create(kind, args).await
    }

    async fn call(
        &self,
        target: Address,
        operation: &str,
        args: &[Value],
    ) -> Result<Confirmation, ExecutionError> {
        let mut step = 0;
        loop {
            match self.inner.call(target, operation, args).await {
                Err(err) if err.is_transient() && step < self.policy.max_retries => {
                    let delay = self.policy.delay(step);
                    step += 1;
                    warn!(
                        operation,
                        address = %target,
                        attempt = step,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Call timed out, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    fn caller(&self) -> Address {
        self.inner.caller()
    }
}
