//! Structured observability hooks for deployment runs.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`], attached to the run future
//! - Emission functions for run and component lifecycle events
//!
//! Events are emitted at `info!` level (`warn!` for failures). Filter with
//! `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{FailureStage, IdentityHandle, OrderPolicy, RunStatus};

/// Span tagged with the run id. Instrument the run future with it so every
/// event of the run carries `run_id`.
pub fn run_span(run_id: &Uuid) -> tracing::Span {
    tracing::info_span!("bringup.run", run_id = %run_id)
}

/// Emit event: run started.
///
/// ```ignore
/// emit_run_started(&run_id, 3, OrderPolicy::Validate);
/// // logs: event=run.started run_id=... components=3 order=validate
/// ```
pub fn emit_run_started(run_id: &Uuid, components: usize, order: OrderPolicy) {
    info!(
        event = "run.started",
        run_id = %run_id,
        components = components,
        order = %order,
    );
}

/// Emit event: a component step began (before argument resolution).
pub fn emit_component_started(name: &str, kind: &str, position: usize) {
    info!(
        event = "component.started",
        component = %name,
        kind = %kind,
        position = position,
    );
}

pub fn emit_component_deployed(name: &str, handle: &IdentityHandle, elapsed_ms: u64) {
    info!(
        event = "component.deployed",
        component = %name,
        handle = %handle,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: a component step failed (warning level).
pub fn emit_component_failed(name: &str, stage: FailureStage, error: &dyn std::fmt::Display) {
    warn!(
        event = "component.failed",
        component = %name,
        stage = %stage,
        error = %error,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &Uuid, status: RunStatus, deployed: usize, duration_ms: u64) {
    let status = match status {
        RunStatus::Succeeded => "succeeded",
        RunStatus::Aborted => "aborted",
    };
    info!(
        event = "run.finished",
        run_id = %run_id,
        status = status,
        deployed = deployed,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let id = Uuid::new_v4();
        let span = run_span(&id);
        let _entered = span.enter();
    }
}
