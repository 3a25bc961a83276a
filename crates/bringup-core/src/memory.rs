//! In-memory target environment.
//!
//! [`MemoryDeployer`] implements [`Deployer`] without any network. It assigns
//! deterministic `0x`-prefixed 40-hex-digit addresses, records every call it
//! receives, and can be told to reject specific kinds or a specific call so
//! that failure paths can be rehearsed.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::deployer::Deployer;
use crate::domain::{ArgValue, EnvironmentError, IdentityHandle};

/// Failure reported by the in-memory environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryEnvironmentError {
    #[error("creation of {kind} reverted by the environment")]
    Reverted { kind: String },

    #[error("environment refused call #{call}")]
    Refused { call: u64 },
}

/// One call received by a [`MemoryDeployer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCall {
    /// 1-based call number.
    pub call: u64,
    pub kind: String,
    pub args: Vec<ArgValue>,
    /// `None` when the call was rejected.
    pub handle: Option<IdentityHandle>,
}

#[derive(Debug, Default)]
struct MemoryState {
    nonce: u64,
    calls: Vec<DeployCall>,
}

#[derive(Debug, Default)]
pub struct MemoryDeployer {
    state: Mutex<MemoryState>,
    reject_kinds: HashSet<String>,
    fail_on_call: Option<u64>,
    latency: Option<Duration>,
}

impl MemoryDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every creation of `kind`.
    pub fn rejecting(mut self, kind: impl Into<String>) -> Self {
        self.reject_kinds.insert(kind.into());
        self
    }

    /// Refuse the `n`-th call (1-based), whatever its kind.
    pub fn failing_on_call(mut self, n: u64) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Delay every call by `latency` before it is accepted.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<DeployCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Address derived from the creation nonce, kind and arguments.
fn derive_address(nonce: u64, kind: &str, args: &[ArgValue]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce.to_be_bytes());
    hasher.update(kind.as_bytes());
    for arg in args {
        hasher.update(b"\0");
        hasher.update(arg.to_string().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    format!("0x{}", &digest[..40])
}

#[async_trait]
impl Deployer for MemoryDeployer {
    async fn deploy(
        &self,
        kind: &str,
        args: &[ArgValue],
    ) -> Result<IdentityHandle, EnvironmentError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        state.nonce += 1;
        let call = state.nonce;

        let outcome: Result<IdentityHandle, EnvironmentError> = if self.fail_on_call == Some(call)
        {
            Err(MemoryEnvironmentError::Refused { call }.into())
        } else if self.reject_kinds.contains(kind) {
            Err(MemoryEnvironmentError::Reverted {
                kind: kind.to_string(),
            }
            .into())
        } else {
            IdentityHandle::new(derive_address(call, kind, args)).map_err(Into::into)
        };

        state.calls.push(DeployCall {
            call,
            kind: kind.to_string(),
            args: args.to_vec(),
            handle: outcome.as_ref().ok().cloned(),
        });
        tracing::debug!(call, kind = %kind, accepted = outcome.is_ok(), "memory deploy call");

        outcome
    }
}
