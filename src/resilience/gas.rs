//! Gas-escalating submission with a transient retry layer.
//!
//! # Layers
//! ```text
//! execute (outer, flat delay, up to `outer_attempts`)
//!     → op(attempt)            caller re-reads nonce, re-signs, re-estimates
//!         → attempt (inner, up to `gas_attempts`)
//!             gas = gas << 1   before every call
//!             call(gas)        submit and await on-chain confirmation
//! ```
//!
//! Both layers consult [`classify`] and nothing else.

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{ChainError, ChainResult};
use crate::config::schema::RetryConfig;
use crate::observability::metrics;
use crate::resilience::classify::{classify, RetryLayer, RetryVerdict};

/// Attempt limits for both layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub gas_attempts: u32,
    pub outer_attempts: u32,
    pub outer_delay: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            gas_attempts: 5,
            outer_attempts: 5,
            outer_delay: Duration::from_millis(100),
        }
    }
}

impl From<&RetryConfig> for EscalationPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            gas_attempts: config.gas_attempts,
            outer_attempts: config.outer_attempts,
            outer_delay: Duration::from_millis(config.outer_delay_ms),
        }
    }
}

/// Executes ledger calls under the two-layer retry policy.
#[derive(Debug, Clone, Default)]
pub struct GasEscalationExecutor {
    policy: EscalationPolicy,
}

impl GasEscalationExecutor {
    pub fn new(policy: EscalationPolicy) -> Self {
        Self { policy }
    }

    /// Inner loop: double the gas limit before each call.
    ///
    /// Returns on the first success. Gas-class failures move on to the next
    /// attempt; anything else aborts immediately. Running out of attempts
    /// yields `RetriesExhausted` wrapping the last failure.
    pub async fn attempt<T, F, Fut>(&self, initial_gas: u64, mut call: F) -> ChainResult<T>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = ChainResult<T>>,
    {
        let mut gas = initial_gas;
        let mut last_error = None;

        for attempt in 1..=self.policy.gas_attempts {
            gas = gas.saturating_mul(2);

            match call(gas).await {
                Ok(result) => {
                    metrics::record_gas_attempt("success");
                    tracing::debug!(attempt, gas_limit = gas, "Call confirmed");
                    return Ok(result);
                }
                Err(e) => match classify(&e, RetryLayer::GasEscalation) {
                    RetryVerdict::Retryable => {
                        metrics::record_gas_attempt("retryable");
                        tracing::warn!(attempt, gas_limit = gas, error = %e, "Call failed, escalating gas");
                        last_error = Some(e);
                    }
                    RetryVerdict::Fatal => {
                        metrics::record_gas_attempt("fatal");
                        tracing::warn!(attempt, gas_limit = gas, error = %e, "Call failed with non-gas error");
                        return Err(e);
                    }
                },
            }
        }

        Err(ChainError::RetriesExhausted {
            attempts: self.policy.gas_attempts,
            last: Box::new(last_error.unwrap_or_else(|| {
                ChainError::NotAvailable("gas escalation ran zero attempts".to_string())
            })),
        })
    }

    /// Outer loop: rerun `op` from scratch after a flat delay.
    ///
    /// `op` receives the 1-based attempt number and is expected to rebuild
    /// everything it depends on (fresh reads, fresh gas estimate) before
    /// entering [`attempt`](Self::attempt).
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> ChainResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ChainResult<T>>,
    {
        let mut attempt = 1;
        loop {
            let error = match op(attempt).await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            if classify(&error, RetryLayer::Transient) == RetryVerdict::Fatal {
                return Err(error);
            }
            if attempt >= self.policy.outer_attempts {
                return Err(ChainError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            metrics::record_outer_retry();
            tracing::warn!(
                attempt,
                max_attempts = self.policy.outer_attempts,
                delay_ms = self.policy.outer_delay.as_millis() as u64,
                error = %error,
                "Submission failed, retrying"
            );
            tokio::time::sleep(self.policy.outer_delay).await;
            attempt += 1;
        }
    }
}
