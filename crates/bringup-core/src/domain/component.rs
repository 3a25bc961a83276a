//! Static component declarations.
//!
//! A [`ComponentSpec`] names one deployable unit, the artifact kind the target
//! environment instantiates for it, and its constructor arguments. Arguments
//! are either literal values or references to the identity handle of another
//! component in the same run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::handle::IdentityHandle;

/// A concrete constructor argument value, as submitted to the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgValue {
    /// Unsigned integer. `u128` so that 18-decimal token quantities fit.
    Uint(u128),
    Text(String),
    Bool(bool),
    /// The identity handle of an already deployed component.
    Handle(IdentityHandle),
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Uint(v) => write!(f, "{}", v),
            ArgValue::Text(v) => write!(f, "{:?}", v),
            ArgValue::Bool(v) => write!(f, "{}", v),
            ArgValue::Handle(h) => write!(f, "{}", h),
        }
    }
}

/// One declared constructor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgDescriptor {
    /// Passed through unchanged.
    Literal(ArgValue),
    /// Substituted with the identity handle of the named component.
    Ref(String),
}

impl ArgDescriptor {
    /// Name of the referenced component, if this is a reference.
    pub fn reference(&self) -> Option<&str> {
        match self {
            ArgDescriptor::Ref(name) => Some(name.as_str()),
            ArgDescriptor::Literal(_) => None,
        }
    }
}

/// Static description of one deployable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Unique symbolic identifier within a run.
    pub name: String,
    /// Artifact the target environment instantiates, e.g. `DreamToken`.
    pub kind: String,
    pub constructor_args: Vec<ArgDescriptor>,
}

impl ComponentSpec {
    /// Create a spec with no constructor arguments.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            constructor_args: Vec::new(),
        }
    }

    /// Append a literal argument.
    pub fn with_literal(mut self, value: ArgValue) -> Self {
        self.constructor_args.push(ArgDescriptor::Literal(value));
        self
    }

    /// Append a reference to another component's identity handle.
    pub fn with_ref(mut self, component: impl Into<String>) -> Self {
        self.constructor_args
            .push(ArgDescriptor::Ref(component.into()));
        self
    }

    /// Distinct referenced component names, in first-reference order.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.constructor_args
            .iter()
            .filter_map(ArgDescriptor::reference)
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Order handling applied before any deploy call is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// Check that every reference points at an earlier declaration.
    #[default]
    Validate,
    /// Deploy in declared order; bad references surface at resolution time.
    Trust,
    /// Compute a topological order, keeping declaration order among peers.
    Sort,
}

impl OrderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPolicy::Validate => "validate",
            OrderPolicy::Trust => "trust",
            OrderPolicy::Sort => "sort",
        }
    }
}

impl std::fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "validate" => Ok(OrderPolicy::Validate),
            "trust" => Ok(OrderPolicy::Trust),
            "sort" => Ok(OrderPolicy::Sort),
            other => Err(format!(
                "unknown order policy '{}' (expected validate, trust or sort)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_are_deduplicated_in_order() {
        let spec = ComponentSpec::new("Pool", "TaxPool")
            .with_ref("Government")
            .with_literal(ArgValue::Uint(7))
            .with_ref("Token")
            .with_ref("Government");
        assert_eq!(spec.dependencies(), vec!["Government", "Token"]);
    }

    #[test]
    fn test_arg_value_display() {
        assert_eq!(ArgValue::Uint(1_000).to_string(), "1000");
        assert_eq!(ArgValue::Text("dream".into()).to_string(), "\"dream\"");
        let h = IdentityHandle::new("0xabc").unwrap();
        assert_eq!(ArgValue::Handle(h).to_string(), "0xabc");
    }

    #[test]
    fn test_order_policy_parse() {
        assert_eq!("SORT".parse::<OrderPolicy>(), Ok(OrderPolicy::Sort));
        assert_eq!(OrderPolicy::default(), OrderPolicy::Validate);
        assert!("topo".parse::<OrderPolicy>().is_err());
    }
}
