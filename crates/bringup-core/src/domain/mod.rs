//! Domain models for bringup.
//!
//! - `ComponentSpec`: static declaration of one deployable unit
//! - `DeploymentRecord` / `DeploymentRun`: runtime results
//! - `IdentityHandle`: address assigned by the target environment

pub mod component;
pub mod error;
pub mod handle;
pub mod record;

pub use component::{ArgDescriptor, ArgValue, ComponentSpec, OrderPolicy};
pub use error::{
    DependencyPosition, DeployError, DeployResult, EnvironmentError, FailureStage, ManifestError,
};
pub use handle::{EmptyHandleError, IdentityHandle};
pub use record::{DeploymentRecord, DeploymentRun, DeploymentStatus, RunStatus};
