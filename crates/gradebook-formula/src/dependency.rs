//! Dependency tracking for formula calculation

use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

/// Dependency graph between formulas
///
/// Tracks which nodes depend on which other nodes and produces an
/// evaluation order. Nodes keep the order in which they were first added,
/// which is also the tie-break order of [`DependencyGraph::topological_order`].
#[derive(Debug, Clone)]
pub struct DependencyGraph<K> {
    /// Nodes in insertion order
    nodes: Vec<K>,
    /// Node → Nodes that depend on it (dependents), in insertion order
    dependents: AHashMap<K, Vec<K>>,
    /// Node → Nodes it depends on (precedents)
    precedents: AHashMap<K, AHashSet<K>>,
}

impl<K> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            dependents: AHashMap::new(),
            precedents: AHashMap::new(),
        }
    }
}

/// Result of a topological sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder<K> {
    /// Nodes in an order where every node comes after its precedents
    pub order: Vec<K>,
    /// Nodes that could not be ordered: members of a cycle, or nodes that
    /// depend on one
    pub cyclic: Vec<K>,
}

impl<K: Copy + Eq + Hash> DependencyGraph<K> {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no dependencies (no-op if already present)
    pub fn add_node(&mut self, node: K) {
        if !self.precedents.contains_key(&node) {
            self.nodes.push(node);
            self.precedents.insert(node, AHashSet::new());
        }
    }

    /// Add a dependency: dependent depends on precedent
    ///
    /// Self-dependencies are ignored.
    pub fn add_dependency(&mut self, precedent: K, dependent: K) {
        if precedent == dependent {
            self.add_node(dependent);
            return;
        }

        self.add_node(precedent);
        self.add_node(dependent);

        let inserted = self
            .precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
        if inserted {
            self.dependents.entry(precedent).or_default().push(dependent);
        }
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[K] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get nodes that depend on the given node
    pub fn dependents_of(&self, node: K) -> impl Iterator<Item = K> + '_ {
        self.dependents
            .get(&node)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
    }

    /// Get nodes that the given node depends on
    pub fn precedents_of(&self, node: K) -> impl Iterator<Item = K> + '_ {
        self.precedents
            .get(&node)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Order the nodes so that precedents come first (Kahn's algorithm)
    ///
    /// Nodes that never reach zero unresolved precedents are returned in
    /// [`TopologicalOrder::cyclic`] instead of failing the whole sort.
    pub fn topological_order(&self) -> TopologicalOrder<K> {
        let mut in_degree: AHashMap<K, usize> = self
            .nodes
            .iter()
            .map(|&node| (node, self.precedents.get(&node).map_or(0, |set| set.len())))
            .collect();

        let mut queue: VecDeque<K> = self
            .nodes
            .iter()
            .copied()
            .filter(|node| in_degree[node] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for dependent in self.dependents_of(node) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        let cyclic = self
            .nodes
            .iter()
            .copied()
            .filter(|node| in_degree[node] > 0)
            .collect();

        TopologicalOrder { order, cyclic }
    }
}
