//! bringup core library
//!
//! Deploys a fixed set of interdependent components onto a target
//! environment in dependency order, threading each component's identity
//! handle into the constructor arguments of the components that need it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bringup_core::{standard_components, DeployConfig, DeploymentOrchestrator, MemoryDeployer};
//!
//! let specs = standard_components(&DeployConfig::default());
//! let orchestrator = DeploymentOrchestrator::new(Arc::new(MemoryDeployer::new()));
//! let run = orchestrator.run(&specs).await;
//! assert!(run.is_succeeded());
//! ```

pub mod config;
pub mod deployer;
pub mod domain;
pub mod graph;
pub mod manifest;
pub mod memory;
pub mod obs;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod telemetry;

pub use config::{standard_components, DeployConfig, DEFAULT_INITIAL_LEDGER_SUPPLY};
pub use deployer::Deployer;
pub use domain::{
    ArgDescriptor, ArgValue, ComponentSpec, DependencyPosition, DeployError, DeployResult,
    DeploymentRecord, DeploymentRun, DeploymentStatus, EnvironmentError, FailureStage,
    IdentityHandle, ManifestError, OrderPolicy, RunStatus,
};
pub use graph::ComponentGraph;
pub use manifest::Manifest;
pub use memory::{DeployCall, MemoryDeployer, MemoryEnvironmentError};
pub use orchestrator::DeploymentOrchestrator;
pub use registry::HandleRegistry;
pub use report::{
    render_run_summary_md, write_run_report_json, write_run_summary_md, RunReport,
};
pub use telemetry::init_tracing;

pub use tokio_util::sync::CancellationToken;
