//! Run reports for operators.
//!
//! A [`RunReport`] shows exactly how far a run got: every attempted
//! component with its status and handle, the failure if any, and the
//! declared components that were never attempted.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ComponentSpec, DeploymentRun, DeploymentStatus, FailureStage, RunStatus};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentReport {
    pub name: String,
    pub kind: String,
    pub status: DeploymentStatus,
    pub identity_handle: Option<String>,
    /// Submitted arguments, rendered as text (quantities exceed JSON number range).
    pub constructor_args: Vec<String>,
    pub deployed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureReport {
    pub component: Option<String>,
    pub stage: FailureStage,
    pub message: String,
}

/// Persisted summary of one [`DeploymentRun`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub status: RunStatus,
    pub components: Vec<ComponentReport>,
    pub failure: Option<FailureReport>,
    /// Declared components with no record, in declaration order.
    pub not_attempted: Vec<String>,
}

impl RunReport {
    /// Build a report from a finished run and the specs it was given.
    pub fn from_run(run: &DeploymentRun, specs: &[ComponentSpec]) -> Self {
        let components: Vec<ComponentReport> = run
            .records()
            .iter()
            .map(|record| ComponentReport {
                name: record.name().to_string(),
                kind: record.kind().to_string(),
                status: record.status(),
                identity_handle: record.identity_handle().map(ToString::to_string),
                constructor_args: record
                    .constructor_args()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                deployed_at: record.deployed_at(),
            })
            .collect();

        let not_attempted = specs
            .iter()
            .filter(|spec| run.record(&spec.name).is_none())
            .map(|spec| spec.name.clone())
            .collect();

        let failure = run.failure().map(|err| FailureReport {
            component: err.component().map(str::to_string),
            stage: err.stage(),
            message: error_chain(err),
        });

        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: run.run_id(),
            status: run.status(),
            components,
            failure,
            not_attempted,
        }
    }

    pub fn deployed_count(&self) -> usize {
        self.components
            .iter()
            .filter(|c| c.status == DeploymentStatus::Deployed)
            .count()
    }
}

/// Error message followed by its source chain, `: `-separated.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Write the report as pretty JSON.
pub fn write_run_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize run report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary of the run.
pub fn render_run_summary_md(report: &RunReport) -> String {
    let status = match report.status {
        RunStatus::Succeeded => "succeeded",
        RunStatus::Aborted => "aborted",
    };

    let mut out = String::new();
    out.push_str("# Deployment Run\n\n");
    out.push_str(&format!(
        "- run: `{}`\n- status: **{}**\n- deployed: {}/{}\n\n",
        report.run_id,
        status,
        report.deployed_count(),
        report.components.len() + report.not_attempted.len()
    ));

    out.push_str("## Components\n");
    if report.components.is_empty() {
        out.push_str("_none attempted_\n");
    }
    for c in &report.components {
        let state = match c.status {
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::Pending => "pending",
        };
        out.push_str(&format!(
            "- {} ({}): {} `{}`\n",
            c.name,
            c.kind,
            state,
            c.identity_handle.as_deref().unwrap_or("-")
        ));
    }

    if let Some(failure) = &report.failure {
        out.push_str("\n## Failure\n");
        out.push_str(&format!(
            "- component: {}\n- stage: {}\n- cause: {}\n",
            failure.component.as_deref().unwrap_or("-"),
            failure.stage,
            failure.message
        ));
    }

    if !report.not_attempted.is_empty() {
        out.push_str("\n## Not Attempted\n");
        for name in &report.not_attempted {
            out.push_str(&format!("- {}\n", name));
        }
    }
    out
}

/// Write the markdown summary.
pub fn write_run_summary_md(path: &Path, report: &RunReport) -> Result<()> {
    let md = render_run_summary_md(report);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
