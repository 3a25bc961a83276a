//! Dependency-ordered deployment runs.
//!
//! [`DeploymentOrchestrator`] takes a declared set of [`ComponentSpec`]s,
//! settles the deployment order according to its [`OrderPolicy`], then
//! deploys one component at a time, threading each identity handle into the
//! constructor arguments of the components that reference it.
//!
//! The first failure aborts the run. Nothing already created is rolled back:
//! the returned [`DeploymentRun`] lists exactly which components exist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::deployer::Deployer;
use crate::domain::{
    ComponentSpec, DeployError, DeployResult, DeploymentRun, OrderPolicy,
};
use crate::graph::ComponentGraph;
use crate::obs;
use crate::registry::HandleRegistry;

/// Caller cancellation and an optional deadline, checked before each call.
struct StopCondition<'a> {
    cancel: &'a CancellationToken,
    deadline: Option<tokio::time::Instant>,
}

impl StopCondition<'_> {
    fn reached(&self) -> bool {
        self.cancel.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| tokio::time::Instant::now() >= deadline)
    }
}

/// Runs deployments against one target environment.
pub struct DeploymentOrchestrator {
    deployer: Arc<dyn Deployer>,
    policy: OrderPolicy,
}

impl DeploymentOrchestrator {
    pub fn new(deployer: Arc<dyn Deployer>) -> Self {
        Self {
            deployer,
            policy: OrderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The order in which `specs` would be deployed under this
    /// orchestrator's policy. See [`order_for`](Self::order_for).
    pub fn plan<'a>(&self, specs: &'a [ComponentSpec]) -> DeployResult<Vec<&'a ComponentSpec>> {
        Self::order_for(self.policy, specs)
    }

    /// The order in which `specs` would be deployed under `policy`.
    ///
    /// * `Validate`: declared order, after checking every reference points
    ///   at an earlier declaration.
    /// * `Trust`: declared order; only duplicate names are rejected.
    /// * `Sort`: topological order, stable with respect to declaration.
    pub fn order_for(
        policy: OrderPolicy,
        specs: &[ComponentSpec],
    ) -> DeployResult<Vec<&ComponentSpec>> {
        match policy {
            OrderPolicy::Trust => {
                let mut seen = std::collections::HashSet::new();
                if let Some(dup) = specs.iter().find(|s| !seen.insert(s.name.as_str())) {
                    return Err(DeployError::DuplicateComponent {
                        component: dup.name.clone(),
                    });
                }
                Ok(specs.iter().collect())
            }
            OrderPolicy::Validate => {
                ComponentGraph::from_specs(specs)?.validate_declared_order()?;
                Ok(specs.iter().collect())
            }
            OrderPolicy::Sort => {
                let order = ComponentGraph::from_specs(specs)?.topological_order()?;
                Ok(order.into_iter().map(|idx| &specs[idx]).collect())
            }
        }
    }

    /// Deploy every spec exactly once, in dependency order.
    pub async fn run(&self, specs: &[ComponentSpec]) -> DeploymentRun {
        self.run_with_cancel(specs, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but cancellable.
    ///
    /// The token is checked before every deploy call. A call already issued
    /// is awaited and its outcome recorded; after cancellation no further
    /// call is made and the run aborts with [`DeployError::Cancelled`].
    pub async fn run_with_cancel(
        &self,
        specs: &[ComponentSpec],
        cancel: &CancellationToken,
    ) -> DeploymentRun {
        self.run_until(specs, cancel, None).await
    }

    /// Like [`run`](Self::run), issuing no deploy call once `timeout` has
    /// elapsed since the start of the run.
    ///
    /// The deadline is checked before every call; a call in progress is not
    /// interrupted.
    pub async fn run_with_timeout(
        &self,
        specs: &[ComponentSpec],
        timeout: Duration,
    ) -> DeploymentRun {
        let deadline = tokio::time::Instant::now() + timeout;
        self.run_until(specs, &CancellationToken::new(), Some(deadline))
            .await
    }

    async fn run_until(
        &self,
        specs: &[ComponentSpec],
        cancel: &CancellationToken,
        deadline: Option<tokio::time::Instant>,
    ) -> DeploymentRun {
        let run_id = Uuid::new_v4();
        let stop = StopCondition { cancel, deadline };
        self.execute(run_id, specs, &stop)
            .instrument(obs::run_span(&run_id))
            .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        specs: &[ComponentSpec],
        stop: &StopCondition<'_>,
    ) -> DeploymentRun {
        let started = Instant::now();
        obs::emit_run_started(&run_id, specs.len(), self.policy);

        let mut registry = HandleRegistry::new();
        let failure = match self.plan(specs) {
            Ok(ordered) => self.deploy_in_order(&ordered, &mut registry, stop).await,
            Err(err) => {
                obs::emit_component_failed(
                    err.component().unwrap_or("-"),
                    err.stage(),
                    &err,
                );
                Err(err)
            }
        }
        .err();

        let run = DeploymentRun::new(run_id, registry.into_records(), failure);
        obs::emit_run_finished(
            &run_id,
            run.status(),
            run.deployed().count(),
            started.elapsed().as_millis() as u64,
        );
        run
    }

    async fn deploy_in_order(
        &self,
        ordered: &[&ComponentSpec],
        registry: &mut HandleRegistry,
        stop: &StopCondition<'_>,
    ) -> DeployResult<()> {
        for (position, spec) in ordered.iter().enumerate() {
            if stop.reached() {
                let err = DeployError::Cancelled {
                    component: spec.name.clone(),
                };
                obs::emit_component_failed(&spec.name, err.stage(), &err);
                return Err(err);
            }

            let slot = registry.begin(spec)?;
            obs::emit_component_started(&spec.name, &spec.kind, position);

            let args = match registry.resolve(spec) {
                Ok(args) => args,
                Err(err) => {
                    registry.fail(slot);
                    obs::emit_component_failed(&spec.name, err.stage(), &err);
                    return Err(err);
                }
            };
            registry.set_constructor_args(slot, args.clone());

            let call_started = Instant::now();
            let handle = match self.deployer.deploy(&spec.kind, &args).await {
                Ok(handle) => handle,
                Err(source) => {
                    registry.fail(slot);
                    let err = DeployError::DeploymentRejected {
                        component: spec.name.clone(),
                        kind: spec.kind.clone(),
                        source,
                    };
                    obs::emit_component_failed(&spec.name, err.stage(), &err);
                    return Err(err);
                }
            };

            if let Err(err) = registry.complete(slot, handle.clone()) {
                obs::emit_component_failed(&spec.name, err.stage(), &err);
                return Err(err);
            }
            obs::emit_component_deployed(
                &spec.name,
                &handle,
                call_started.elapsed().as_millis() as u64,
            );
        }
        Ok(())
    }
}
