//! The deploy capability of a target environment.

use async_trait::async_trait;

use crate::domain::{ArgValue, EnvironmentError, IdentityHandle};

/// Client for a target environment that creates component instances.
///
/// Inject a real network client, or [`crate::memory::MemoryDeployer`] for
/// rehearsals and tests. Each call creates irreversible external state, so
/// the orchestrator never retries or resubmits one.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Create an instance of `kind` with `args`, returning its identity handle
    /// once the environment confirms creation.
    async fn deploy(
        &self,
        kind: &str,
        args: &[ArgValue],
    ) -> Result<IdentityHandle, EnvironmentError>;
}
