//! Dependency graph module.
//!
//! Provides `DependencyGraph`, built from the formulas of a container's
//! stats. An edge `Strength -> Damage` means Damage's formula names
//! Strength, so Damage must be recomputed whenever Strength's basic value
//! changes.
//!
//! Self-references are never turned into edges. Longer cycles are found
//! by [`DependencyGraph::detect_cycles`] and rejected by the container.

use crate::error::StatError;
use crate::stat::Stat;
use crate::stat_id::StatId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Directed graph from referenced stats to the formula stats that read
/// them.
///
/// # Examples
///
/// ```rust
/// use statforge::graph::DependencyGraph;
/// use statforge::StatId;
///
/// let mut graph = DependencyGraph::new();
/// let strength = StatId::from_str("Strength");
/// let damage = StatId::from_str("Damage");
///
/// // Damage's formula reads Strength
/// graph.add_edge(strength.clone(), damage.clone());
///
/// assert_eq!(graph.dependents(&strength), vec![damage]);
/// assert!(graph.detect_cycles().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<StatId, ()>,
    node_map: HashMap<StatId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every stat's formula.
    ///
    /// Variables that do not name a stat in `stats` are skipped with a
    /// warning; at evaluation time they resolve to `0`.
    pub fn build(stats: &[Stat]) -> Self {
        let known: HashSet<&StatId> = stats.iter().map(|s| s.id()).collect();
        let mut graph = Self::new();

        for stat in stats {
            let Some(formula) = stat.formula() else {
                continue;
            };
            if !formula.is_valid() {
                warn!(stat = %stat.id(), formula = formula.text(), "formula does not parse");
                continue;
            }
            for variable in formula.variables() {
                if variable == stat.id() {
                    continue;
                }
                if !known.contains(variable) {
                    warn!(stat = %stat.id(), variable = %variable, "formula references an unknown stat");
                    continue;
                }
                graph.add_edge(variable.clone(), stat.id().clone());
            }
        }

        graph
    }

    /// Add a node if it doesn't exist and return its index.
    pub fn add_node(&mut self, stat_id: StatId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&stat_id) {
            idx
        } else {
            let idx = self.graph.add_node(stat_id.clone());
            self.node_map.insert(stat_id, idx);
            idx
        }
    }

    /// Record that `dependent` must recompute when `source` changes.
    /// Adding the same edge twice is a no-op.
    pub fn add_edge(&mut self, source: StatId, dependent: StatId) {
        let source_idx = self.add_node(source);
        let dependent_idx = self.add_node(dependent);
        self.graph.update_edge(source_idx, dependent_idx, ());
    }

    /// Direct dependents of `stat_id`, sorted by id.
    pub fn dependents(&self, stat_id: &StatId) -> Vec<StatId> {
        let Some(&idx) = self.node_map.get(stat_id) else {
            return Vec::new();
        };
        let mut out: Vec<StatId> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out
    }

    /// Stats that at least one formula depends on, sorted by id.
    pub fn sources(&self) -> Vec<StatId> {
        let mut out: Vec<StatId> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_some()
            })
            .map(|idx| self.graph[idx].clone())
            .collect();
        out.sort();
        out
    }

    /// The graph as `source -> {dependents}`.
    pub fn to_adjacency(&self) -> BTreeMap<StatId, BTreeSet<StatId>> {
        let mut adjacency: BTreeMap<StatId, BTreeSet<StatId>> = BTreeMap::new();
        for edge in self.graph.raw_edges() {
            adjacency
                .entry(self.graph[edge.source()].clone())
                .or_default()
                .insert(self.graph[edge.target()].clone());
        }
        adjacency
    }

    pub fn contains_node(&self, stat_id: &StatId) -> bool {
        self.node_map.contains_key(stat_id)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Detect cycles in the graph.
    ///
    /// Uses depth-first search and reports the first cycle found as a
    /// closed path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statforge::graph::DependencyGraph;
    /// use statforge::{StatError, StatId};
    ///
    /// let mut graph = DependencyGraph::new();
    /// let a = StatId::from_str("A");
    /// let b = StatId::from_str("B");
    ///
    /// graph.add_edge(a.clone(), b.clone());
    /// assert!(graph.detect_cycles().is_ok());
    ///
    /// graph.add_edge(b.clone(), a.clone());
    /// assert!(matches!(graph.detect_cycles(), Err(StatError::Cycle { .. })));
    /// ```
    pub fn detect_cycles(&self) -> Result<(), StatError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut cycle_path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut cycle_path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        cycle_path: &mut Vec<StatId>,
    ) -> Option<StatError> {
        visited.insert(node);
        rec_stack.insert(node);
        cycle_path.push(self.graph[node].clone());

        for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, cycle_path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let neighbor_stat = self.graph[neighbor].clone();
                let start = cycle_path
                    .iter()
                    .position(|stat| stat == &neighbor_stat)
                    .unwrap_or(0);
                let mut path = cycle_path[start..].to_vec();
                path.push(neighbor_stat);
                return Some(StatError::Cycle { path });
            }
        }

        rec_stack.remove(&node);
        cycle_path.pop();
        None
    }
}
