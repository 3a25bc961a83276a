//! TOML deployment manifests.
//!
//! ```toml
//! [parameters]
//! initial_ledger_supply = "1000000000000000000000"
//!
//! [deploy]
//! order = "validate"
//! timeout_secs = 600
//!
//! [[components]]
//! name = "Government"
//! kind = "DreamGovernment"
//!
//! [[components]]
//! name = "Token"
//! kind = "DreamToken"
//! args = [{ param = "initial_ledger_supply" }, { ref = "Government" }]
//! ```
//!
//! TOML integers are 64-bit, so large quantities are written as strings.
//! Without a `components` array the standard stack is deployed.

use std::path::Path;

use serde::Deserialize;

use crate::config::{parse_uint, standard_components, DeployConfig};
use crate::domain::{ArgDescriptor, ArgValue, ComponentSpec, ManifestError, OrderPolicy};

/// An unsigned integer given either as a TOML integer or a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UintLiteral {
    Int(i64),
    Text(String),
}

impl UintLiteral {
    fn to_u128(&self, field: &str) -> Result<u128, ManifestError> {
        let parsed = match self {
            UintLiteral::Int(v) => u128::try_from(*v).ok(),
            UintLiteral::Text(s) => parse_uint(s),
        };
        parsed.ok_or_else(|| ManifestError::InvalidNumber {
            field: field.to_string(),
            value: match self {
                UintLiteral::Int(v) => v.to_string(),
                UintLiteral::Text(s) => s.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestParameters {
    pub initial_ledger_supply: Option<UintLiteral>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestDeploy {
    pub order: Option<OrderPolicy>,
    pub timeout_secs: Option<u64>,
}

/// One constructor argument in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgEntry {
    Ref(String),
    Param(String),
    Uint(UintLiteral),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub args: Vec<ArgEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub parameters: ManifestParameters,
    #[serde(default)]
    pub deploy: ManifestDeploy,
    pub components: Option<Vec<ComponentEntry>>,
}

impl Manifest {
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parameters and settings, with defaults for anything unset.
    pub fn config(&self) -> Result<DeployConfig, ManifestError> {
        let mut config = DeployConfig::default();
        if let Some(supply) = &self.parameters.initial_ledger_supply {
            config.initial_ledger_supply =
                supply.to_u128("parameters.initial_ledger_supply")?;
        }
        if let Some(order) = self.deploy.order {
            config.order = order;
        }
        config.timeout_secs = self.deploy.timeout_secs;
        Ok(config)
    }

    /// Component specs, with `param` arguments taken from `config`.
    ///
    /// Dependency references are not checked here; that happens when the
    /// orchestrator plans the run.
    pub fn component_specs(
        &self,
        config: &DeployConfig,
    ) -> Result<Vec<ComponentSpec>, ManifestError> {
        let Some(entries) = &self.components else {
            return Ok(standard_components(config));
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| -> Result<ComponentSpec, ManifestError> {
                if entry.name.trim().is_empty() {
                    return Err(ManifestError::EmptyField {
                        index,
                        field: "name",
                    });
                }
                if entry.kind.trim().is_empty() {
                    return Err(ManifestError::EmptyField {
                        index,
                        field: "kind",
                    });
                }
                let constructor_args = entry
                    .args
                    .iter()
                    .enumerate()
                    .map(|(arg_index, arg)| arg_descriptor(config, index, arg_index, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ComponentSpec {
                    name: entry.name.clone(),
                    kind: entry.kind.clone(),
                    constructor_args,
                })
            })
            .collect()
    }
}

fn arg_descriptor(
    config: &DeployConfig,
    index: usize,
    arg_index: usize,
    arg: &ArgEntry,
) -> Result<ArgDescriptor, ManifestError> {
    let literal = match arg {
        ArgEntry::Ref(name) => return Ok(ArgDescriptor::Ref(name.clone())),
        ArgEntry::Param(name) => config
            .parameter(name)
            .ok_or_else(|| ManifestError::UnknownParameter(name.clone()))?,
        ArgEntry::Uint(v) => {
            ArgValue::Uint(v.to_u128(&format!("components[{}].args[{}]", index, arg_index))?)
        }
        ArgEntry::Text(s) => ArgValue::Text(s.clone()),
        ArgEntry::Bool(b) => ArgValue::Bool(*b),
    };
    Ok(ArgDescriptor::Literal(literal))
}
