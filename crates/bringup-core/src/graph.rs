//! Component dependency graph and deployment ordering.
//!
//! Components are nodes; an edge `A → B` means "B takes A's identity handle
//! as a constructor argument", so A must be deployed first. Edges come only
//! from [`ArgDescriptor::Ref`](crate::domain::ArgDescriptor) entries.
//!
//! Topological ordering uses Kahn's algorithm with ties broken by
//! declaration index, so an already valid declared order is returned as is.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use crate::domain::{ComponentSpec, DependencyPosition, DeployError, DeployResult};

/// Directed dependency graph over the components of one run.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    /// Component names in declaration order.
    names: Vec<String>,
    index: HashMap<String, usize>,
    /// `dependency → {dependent, ...}` by declaration index.
    downstream: Vec<BTreeSet<usize>>,
    /// `dependent → {dependency, ...}` by declaration index.
    upstream: Vec<BTreeSet<usize>>,
}

impl ComponentGraph {
    /// Build the graph from declared specs.
    ///
    /// Fails with [`DeployError::DuplicateComponent`] on a repeated name and
    /// with [`DeployError::DependencyOrder`] when a spec references an
    /// undeclared component or itself.
    pub fn from_specs(specs: &[ComponentSpec]) -> DeployResult<Self> {
        let mut graph = Self::default();
        for spec in specs {
            if graph.index.contains_key(&spec.name) {
                return Err(DeployError::DuplicateComponent {
                    component: spec.name.clone(),
                });
            }
            graph.index.insert(spec.name.clone(), graph.names.len());
            graph.names.push(spec.name.clone());
            graph.downstream.push(BTreeSet::new());
            graph.upstream.push(BTreeSet::new());
        }

        for (dependent, spec) in specs.iter().enumerate() {
            for dependency in spec.dependencies() {
                let Some(&dep_idx) = graph.index.get(dependency) else {
                    return Err(DeployError::DependencyOrder {
                        component: spec.name.clone(),
                        dependency: dependency.to_string(),
                        position: DependencyPosition::NotDeclared,
                    });
                };
                if dep_idx == dependent {
                    return Err(DeployError::DependencyOrder {
                        component: spec.name.clone(),
                        dependency: dependency.to_string(),
                        position: DependencyPosition::SelfReference,
                    });
                }
                graph.downstream[dep_idx].insert(dependent);
                graph.upstream[dependent].insert(dep_idx);
            }
        }

        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check that every dependency is declared before its dependent.
    ///
    /// Reports the first offending reference in declaration order.
    pub fn validate_declared_order(&self) -> DeployResult<()> {
        for (dependent, deps) in self.upstream.iter().enumerate() {
            if let Some(&later) = deps.iter().find(|&&dep| dep > dependent) {
                return Err(DeployError::DependencyOrder {
                    component: self.names[dependent].clone(),
                    dependency: self.names[later].clone(),
                    position: DependencyPosition::DeclaredLater,
                });
            }
        }
        Ok(())
    }

    /// Declaration indices in topological order (dependencies first).
    ///
    /// Among components whose dependencies are all satisfied, the earliest
    /// declared goes first. Returns [`DeployError::DependencyCycle`] naming
    /// every component left unordered when a cycle is present.
    pub fn topological_order(&self) -> DeployResult<Vec<usize>> {
        let mut in_degree: Vec<usize> = self.upstream.iter().map(BTreeSet::len).collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut sorted = Vec::with_capacity(self.names.len());
        while let Some(Reverse(idx)) = ready.pop() {
            sorted.push(idx);
            for &dependent in &self.downstream[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if sorted.len() != self.names.len() {
            let components = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &deg)| deg > 0)
                .map(|(idx, _)| self.names[idx].clone())
                .collect();
            return Err(DeployError::DependencyCycle { components });
        }

        Ok(sorted)
    }

    /// Direct dependencies of `name`, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&str>> {
        let idx = *self.index.get(name)?;
        Some(
            self.upstream[idx]
                .iter()
                .map(|&dep| self.names[dep].as_str())
                .collect(),
        )
    }

    /// Direct dependents of `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Option<Vec<&str>> {
        let idx = *self.index.get(name)?;
        Some(
            self.downstream[idx]
                .iter()
                .map(|&dep| self.names[dep].as_str())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArgValue;

    fn spec(name: &str, deps: &[&str]) -> ComponentSpec {
        deps.iter()
            .fold(ComponentSpec::new(name, name), |s, dep| s.with_ref(*dep))
    }

    fn names(specs: &[ComponentSpec], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| specs[i].name.clone()).collect()
    }

    #[test]
    fn test_valid_declared_order_passes() {
        let specs = vec![
            spec("Government", &[]),
            spec("Token", &["Government"]),
            spec("TaxPool", &["Government", "Token"]),
        ];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        assert!(g.validate_declared_order().is_ok());
        assert_eq!(g.topological_order().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_reference_to_later_declaration_fails_validation() {
        let specs = vec![spec("Token", &["Government"]), spec("Government", &[])];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        match g.validate_declared_order() {
            Err(DeployError::DependencyOrder {
                component,
                dependency,
                position,
            }) => {
                assert_eq!(component, "Token");
                assert_eq!(dependency, "Government");
                assert_eq!(position, DependencyPosition::DeclaredLater);
            }
            other => panic!("expected DependencyOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_sort_reorders_and_keeps_declaration_order_among_peers() {
        let specs = vec![
            spec("TaxPool", &["Government", "Token"]),
            spec("Token", &["Government"]),
            spec("Audit", &[]),
            spec("Government", &[]),
        ];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        let order = g.topological_order().unwrap();
        assert_eq!(
            names(&specs, &order),
            vec!["Audit", "Government", "Token", "TaxPool"]
        );
    }

    #[test]
    fn test_cycle_detected() {
        let specs = vec![spec("A", &["B"]), spec("B", &["A"]), spec("C", &[])];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        match g.topological_order() {
            Err(DeployError::DependencyCycle { components }) => {
                assert_eq!(components, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("expected DependencyCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_and_self_references_rejected() {
        let undeclared = vec![spec("Token", &["Government"])];
        assert!(matches!(
            ComponentGraph::from_specs(&undeclared),
            Err(DeployError::DependencyOrder {
                position: DependencyPosition::NotDeclared,
                ..
            })
        ));

        let selfish = vec![spec("Loop", &["Loop"])];
        assert!(matches!(
            ComponentGraph::from_specs(&selfish),
            Err(DeployError::DependencyOrder {
                position: DependencyPosition::SelfReference,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let specs = vec![spec("Token", &[]), spec("Token", &[])];
        assert!(matches!(
            ComponentGraph::from_specs(&specs),
            Err(DeployError::DuplicateComponent { .. })
        ));
    }

    #[test]
    fn test_literals_do_not_create_edges() {
        let specs = vec![
            ComponentSpec::new("Token", "DreamToken").with_literal(ArgValue::Uint(1)),
            spec("Government", &[]),
        ];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        assert!(g.validate_declared_order().is_ok());
        assert_eq!(g.dependencies_of("Token"), Some(vec![]));
    }

    #[test]
    fn test_dependents_and_dependencies_lookup() {
        let specs = vec![
            spec("Government", &[]),
            spec("Token", &["Government"]),
            spec("TaxPool", &["Government", "Token"]),
        ];
        let g = ComponentGraph::from_specs(&specs).unwrap();
        assert_eq!(
            g.dependents_of("Government"),
            Some(vec!["Token", "TaxPool"])
        );
        assert_eq!(
            g.dependencies_of("TaxPool"),
            Some(vec!["Government", "Token"])
        );
        assert!(g.dependencies_of("missing").is_none());
        assert_eq!(g.len(), 3);
    }
}
