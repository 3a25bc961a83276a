//! Run-scoped registry of deployment records.
//!
//! Owned by exactly one run and populated monotonically: a record is added
//! when its step begins and only moves forward through its state machine.
//! Reference arguments are resolved against `Deployed` records only.

use std::collections::HashMap;

use chrono::Utc;

use crate::domain::{
    ArgDescriptor, ArgValue, ComponentSpec, DeployError, DeployResult, DeploymentRecord,
    DeploymentStatus, IdentityHandle,
};

/// Position of a record inside a [`HandleRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

#[derive(Debug, Default)]
pub struct HandleRegistry {
    records: Vec<DeploymentRecord>,
    by_name: HashMap<String, usize>,
    /// `handle → owning component`, for uniqueness within the run.
    assigned: HashMap<IdentityHandle, String>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a `Pending` record for `spec`.
    pub fn begin(&mut self, spec: &ComponentSpec) -> DeployResult<Slot> {
        if self.by_name.contains_key(&spec.name) {
            return Err(DeployError::DuplicateComponent {
                component: spec.name.clone(),
            });
        }
        let slot = self.records.len();
        self.records.push(DeploymentRecord::pending(spec));
        self.by_name.insert(spec.name.clone(), slot);
        Ok(Slot(slot))
    }

    /// Handle of a `Deployed` component.
    ///
    /// `component` and `index` only describe the requesting argument for the
    /// error; lookup depends on `dependency` alone.
    pub fn resolve_ref(
        &self,
        component: &str,
        index: usize,
        dependency: &str,
    ) -> DeployResult<&IdentityHandle> {
        self.by_name
            .get(dependency)
            .map(|&slot| &self.records[slot])
            .filter(|record| record.status() == DeploymentStatus::Deployed)
            .and_then(DeploymentRecord::identity_handle)
            .ok_or_else(|| DeployError::UnresolvedDependency {
                component: component.to_string(),
                dependency: dependency.to_string(),
                index,
            })
    }

    /// Substitute every reference in `spec` with a deployed handle.
    pub fn resolve(&self, spec: &ComponentSpec) -> DeployResult<Vec<ArgValue>> {
        spec.constructor_args
            .iter()
            .enumerate()
            .map(|(index, arg)| match arg {
                ArgDescriptor::Literal(value) => Ok(value.clone()),
                ArgDescriptor::Ref(dependency) => self
                    .resolve_ref(&spec.name, index, dependency)
                    .map(|handle| ArgValue::Handle(handle.clone())),
            })
            .collect()
    }

    pub fn set_constructor_args(&mut self, slot: Slot, args: Vec<ArgValue>) {
        self.records[slot.0].set_constructor_args(args);
    }

    /// Move a record to `Deployed`.
    ///
    /// A handle already owned by another component in this run marks the
    /// record `Failed` and returns [`DeployError::DuplicateHandle`].
    pub fn complete(&mut self, slot: Slot, handle: IdentityHandle) -> DeployResult<()> {
        let name = self.records[slot.0].name().to_string();
        if let Some(owner) = self.assigned.get(&handle) {
            let err = DeployError::DuplicateHandle {
                component: name,
                handle,
                assigned_to: owner.clone(),
            };
            self.records[slot.0].mark_failed();
            return Err(err);
        }
        self.assigned.insert(handle.clone(), name);
        self.records[slot.0].mark_deployed(handle, Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, slot: Slot) {
        self.records[slot.0].mark_failed();
    }

    pub fn record(&self, slot: Slot) -> &DeploymentRecord {
        &self.records[slot.0]
    }

    pub fn into_records(self) -> Vec<DeploymentRecord> {
        self.records
    }
}
