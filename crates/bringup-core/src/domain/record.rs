//! Runtime records of a deployment run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component::{ArgValue, ComponentSpec};
use super::error::DeployError;
use super::handle::IdentityHandle;

/// Per-component state. `Pending -> Deployed` or `Pending -> Failed`, both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Deployed,
    Failed,
}

/// Result of deploying one [`ComponentSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    name: String,
    kind: String,
    constructor_args: Vec<ArgValue>,
    identity_handle: Option<IdentityHandle>,
    status: DeploymentStatus,
    deployed_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    pub(crate) fn pending(spec: &ComponentSpec) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind.clone(),
            constructor_args: Vec::new(),
            identity_handle: None,
            status: DeploymentStatus::Pending,
            deployed_at: None,
        }
    }

    pub(crate) fn set_constructor_args(&mut self, args: Vec<ArgValue>) {
        debug_assert_eq!(self.status, DeploymentStatus::Pending);
        self.constructor_args = args;
    }

    pub(crate) fn mark_deployed(&mut self, handle: IdentityHandle, at: DateTime<Utc>) {
        debug_assert_eq!(self.status, DeploymentStatus::Pending);
        self.identity_handle = Some(handle);
        self.deployed_at = Some(at);
        self.status = DeploymentStatus::Deployed;
    }

    pub(crate) fn mark_failed(&mut self) {
        debug_assert_eq!(self.status, DeploymentStatus::Pending);
        self.status = DeploymentStatus::Failed;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Arguments as submitted, references already substituted.
    pub fn constructor_args(&self) -> &[ArgValue] {
        &self.constructor_args
    }

    /// Set only once the record is `Deployed`.
    pub fn identity_handle(&self) -> Option<&IdentityHandle> {
        self.identity_handle.as_ref()
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    pub fn deployed_at(&self) -> Option<DateTime<Utc>> {
        self.deployed_at
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Aborted,
}

/// One end-to-end execution over a fixed set of specs.
///
/// Records appear in the order actually used and stop at the failed one;
/// components that were never attempted have no record.
#[derive(Debug)]
pub struct DeploymentRun {
    run_id: Uuid,
    records: Vec<DeploymentRecord>,
    failure: Option<DeployError>,
}

impl DeploymentRun {
    pub(crate) fn new(
        run_id: Uuid,
        records: Vec<DeploymentRecord>,
        failure: Option<DeployError>,
    ) -> Self {
        Self {
            run_id,
            records,
            failure,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> RunStatus {
        let all_deployed = self
            .records
            .iter()
            .all(|r| r.status() == DeploymentStatus::Deployed);
        if self.failure.is_none() && all_deployed {
            RunStatus::Succeeded
        } else {
            RunStatus::Aborted
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status() == RunStatus::Succeeded
    }

    pub fn records(&self) -> &[DeploymentRecord] {
        &self.records
    }

    /// The error that aborted the run.
    pub fn failure(&self) -> Option<&DeployError> {
        self.failure.as_ref()
    }

    pub fn record(&self, name: &str) -> Option<&DeploymentRecord> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// Handle of a deployed component.
    pub fn handle_of(&self, name: &str) -> Option<&IdentityHandle> {
        self.record(name).and_then(DeploymentRecord::identity_handle)
    }

    /// Successfully deployed components and their handles, in deploy order.
    pub fn deployed(&self) -> impl Iterator<Item = (&str, &IdentityHandle)> {
        self.records
            .iter()
            .filter_map(|r| r.identity_handle().map(|h| (r.name(), h)))
    }

    /// Consume the run, returning the failure if it aborted.
    pub fn into_result(self) -> Result<Vec<DeploymentRecord>, DeployError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.records),
        }
    }
}
