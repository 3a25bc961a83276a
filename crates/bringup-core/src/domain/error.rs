//! Error taxonomy for deployment runs and manifests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::handle::IdentityHandle;

/// Native error reported by a target environment client.
pub type EnvironmentError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where a dependency reference points relative to the referring component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPosition {
    NotDeclared,
    DeclaredLater,
    SelfReference,
}

impl std::fmt::Display for DependencyPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyPosition::NotDeclared => f.write_str("is not declared"),
            DependencyPosition::DeclaredLater => f.write_str("is declared later"),
            DependencyPosition::SelfReference => f.write_str("is the component itself"),
        }
    }
}

/// The run step at which a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Before any deploy call.
    Validate,
    /// While substituting references with identity handles.
    Resolve,
    /// During or right after the deploy call.
    Deploy,
    /// Caller cancelled the run or its timeout elapsed.
    Cancelled,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureStage::Validate => "validate",
            FailureStage::Resolve => "resolve",
            FailureStage::Deploy => "deploy",
            FailureStage::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Errors that abort a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("dependency order violated: '{component}' references '{dependency}', which {position}")]
    DependencyOrder {
        component: String,
        dependency: String,
        position: DependencyPosition,
    },

    #[error("unresolved dependency: '{component}' argument {index} references '{dependency}', which has no deployed record")]
    UnresolvedDependency {
        component: String,
        dependency: String,
        index: usize,
    },

    #[error("deployment of '{component}' ({kind}) rejected by target environment: {source}")]
    DeploymentRejected {
        component: String,
        kind: String,
        #[source]
        source: EnvironmentError,
    },

    #[error("target environment returned handle {handle} for '{component}', already assigned to '{assigned_to}'")]
    DuplicateHandle {
        component: String,
        handle: IdentityHandle,
        assigned_to: String,
    },

    #[error("component declared more than once: {component}")]
    DuplicateComponent { component: String },

    #[error("dependency cycle detected involving components: {components:?}")]
    DependencyCycle { components: Vec<String> },

    #[error("run cancelled before deploying '{component}'")]
    Cancelled { component: String },
}

impl DeployError {
    pub fn stage(&self) -> FailureStage {
        match self {
            DeployError::DependencyOrder { .. }
            | DeployError::DuplicateComponent { .. }
            | DeployError::DependencyCycle { .. } => FailureStage::Validate,
            DeployError::UnresolvedDependency { .. } => FailureStage::Resolve,
            DeployError::DeploymentRejected { .. } | DeployError::DuplicateHandle { .. } => {
                FailureStage::Deploy
            }
            DeployError::Cancelled { .. } => FailureStage::Cancelled,
        }
    }

    /// The component the failure is attributed to, if any single one is.
    pub fn component(&self) -> Option<&str> {
        match self {
            DeployError::DependencyOrder { component, .. }
            | DeployError::UnresolvedDependency { component, .. }
            | DeployError::DeploymentRejected { component, .. }
            | DeployError::DuplicateHandle { component, .. }
            | DeployError::DuplicateComponent { component }
            | DeployError::Cancelled { component } => Some(component),
            DeployError::DependencyCycle { .. } => None,
        }
    }
}

/// Result type for orchestration operations.
pub type DeployResult<T> = std::result::Result<T, DeployError>;

/// Errors produced while loading a deployment manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid unsigned integer '{value}' for {field}")]
    InvalidNumber { field: String, value: String },

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("component at position {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_order_error_displays_names() {
        let err = DeployError::DependencyOrder {
            component: "Token".to_string(),
            dependency: "Government".to_string(),
            position: DependencyPosition::DeclaredLater,
        };
        let msg = err.to_string();
        assert!(msg.contains("Token"));
        assert!(msg.contains("Government"));
        assert!(msg.contains("declared later"));
        assert_eq!(err.stage(), FailureStage::Validate);
    }

    #[test]
    fn test_rejected_error_keeps_native_source() {
        let native: EnvironmentError = "out of gas".into();
        let err = DeployError::DeploymentRejected {
            component: "Token".to_string(),
            kind: "DreamToken".to_string(),
            source: native,
        };
        assert!(err.to_string().contains("out of gas"));
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "out of gas");
        assert_eq!(err.stage(), FailureStage::Deploy);
        assert_eq!(err.component(), Some("Token"));
    }

    #[test]
    fn test_cycle_error_has_no_single_component() {
        let err = DeployError::DependencyCycle {
            components: vec!["A".to_string(), "B".to_string()],
        };
        assert!(err.component().is_none());
        let msg = err.to_string();
        assert!(msg.contains("\"A\""));
        assert!(msg.contains("\"B\""));
    }
}
