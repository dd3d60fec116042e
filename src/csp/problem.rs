//! Problem definition consumed by the backtracking solver

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

/// Contract violations detected while assembling a [`CspProblem`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError {
    #[error("variable {0} appears more than once")]
    DuplicateVariable(String),
    #[error("variable {0} has no domain")]
    MissingDomain(String),
    #[error("neighbor relation references unknown variable {0}")]
    UnknownNeighbor(String),
}

/// A binary constraint satisfaction problem over opaque variables and values.
///
/// Variables are addressed by their generation index internally; the index
/// order is the order in which the variables were supplied and is what the
/// solver uses to break ties.
#[derive(Debug, Clone)]
pub struct CspProblem<V, D> {
    variables: Vec<V>,
    index: HashMap<V, usize>,
    domains: Vec<Vec<D>>,
    neighbors: Vec<Vec<usize>>,
}

impl<V, D> CspProblem<V, D>
where
    V: Clone + Eq + Hash + Debug,
    D: Clone,
{
    /// Assemble a problem from variables, their ordered domains and a neighbor relation.
    ///
    /// The neighbor relation is made symmetric and self-loops are dropped.
    pub fn new(
        variables: Vec<V>,
        mut domains: HashMap<V, Vec<D>>,
        neighbors: &HashMap<V, HashSet<V>>,
    ) -> Result<Self, CspError> {
        let mut index = HashMap::with_capacity(variables.len());
        for (i, var) in variables.iter().enumerate() {
            if index.insert(var.clone(), i).is_some() {
                return Err(CspError::DuplicateVariable(format!("{:?}", var)));
            }
        }

        let mut ordered_domains = Vec::with_capacity(variables.len());
        for var in &variables {
            let domain = domains
                .remove(var)
                .ok_or_else(|| CspError::MissingDomain(format!("{:?}", var)))?;
            ordered_domains.push(domain);
        }

        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); variables.len()];
        for (var, linked) in neighbors {
            let i = *index
                .get(var)
                .ok_or_else(|| CspError::UnknownNeighbor(format!("{:?}", var)))?;
            for other in linked {
                let j = *index
                    .get(other)
                    .ok_or_else(|| CspError::UnknownNeighbor(format!("{:?}", other)))?;
                if i != j {
                    adjacency[i].insert(j);
                    adjacency[j].insert(i);
                }
            }
        }

        Ok(Self {
            variables,
            index,
            domains: ordered_domains,
            neighbors: adjacency.into_iter().map(|set| set.into_iter().collect()).collect(),
        })
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// All variables in generation order
    pub fn variables(&self) -> &[V] {
        &self.variables
    }

    pub fn variable(&self, idx: usize) -> &V {
        &self.variables[idx]
    }

    /// Generation index of a variable
    pub fn index_of(&self, var: &V) -> Option<usize> {
        self.index.get(var).copied()
    }

    /// The initial (unpruned) domain of a variable
    pub fn domain(&self, idx: usize) -> &[D] {
        &self.domains[idx]
    }

    /// Neighbor indices of a variable, ascending
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.neighbors[idx]
    }

    /// Variables whose initial domain is already empty
    pub fn empty_domains(&self) -> Vec<&V> {
        self.variables
            .iter()
            .zip(&self.domains)
            .filter(|(_, domain)| domain.is_empty())
            .map(|(var, _)| var)
            .collect()
    }

    /// Total number of neighbor pairs (each unordered pair counted once)
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub(crate) fn domains(&self) -> &[Vec<D>] {
        &self.domains
    }
}
