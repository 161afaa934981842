//! Graph topology storage: node map to outgoing adjacency to parallel
//! edge weights.

use std::collections::HashMap;

use smallvec::SmallVec;

use trellis_core::error::{TrellisError, TrellisResult};
use trellis_core::types::{NodeName, Weight};

use crate::dijkstra;

/// Parallel edge weights for one (source, target) pair, in insertion order.
pub type EdgeWeights = SmallVec<[Weight; 4]>;

/// Outgoing adjacency of a single node.
pub type Adjacency = HashMap<NodeName, EdgeWeights>;

/// In-memory directed weighted multigraph.
///
/// Invariant: every name appearing as an adjacency target is also a
/// top-level node key. Operations validate existence before mutating, so
/// the invariant never needs repair after the fact.
pub struct GraphStore {
    nodes: HashMap<NodeName, Adjacency>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes
            .values()
            .map(|adjacency| adjacency.values().map(|weights| weights.len()).sum::<usize>())
            .sum()
    }

    /// All node names, in no particular order. Every one of them gets a
    /// record in a resolver run.
    pub fn node_names(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.keys()
    }

    /// Outgoing adjacency of a node, if it exists.
    pub fn adjacency(&self, name: &str) -> Option<&Adjacency> {
        self.nodes.get(name)
    }

    pub fn add_node(&mut self, name: NodeName) -> TrellisResult<()> {
        if self.nodes.contains_key(&name) {
            return Err(TrellisError::NodeAlreadyExists(name));
        }
        self.nodes.insert(name, Adjacency::new());
        Ok(())
    }

    /// Remove a node together with its outgoing edges, and strip it as a
    /// target from every other node's adjacency.
    pub fn remove_node(&mut self, name: &str) -> TrellisResult<()> {
        if self.nodes.remove(name).is_none() {
            return Err(TrellisError::NodeNotFound(NodeName::from(name)));
        }
        for adjacency in self.nodes.values_mut() {
            adjacency.remove(name);
        }
        Ok(())
    }

    /// Append one more parallel edge from `source` to `target`. Self-loops
    /// and duplicate weights are permitted.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: Weight) -> TrellisResult<()> {
        self.validate_exists(source)?;
        self.validate_exists(target)?;
        let adjacency = self
            .nodes
            .get_mut(source)
            .ok_or_else(|| TrellisError::NodeNotFound(NodeName::from(source)))?;
        adjacency
            .entry(NodeName::from(target))
            .or_default()
            .push(weight);
        Ok(())
    }

    /// Remove the whole parallel family from `source` to `target`. Removing
    /// a pair with no edges is not an error as long as both nodes exist.
    pub fn remove_edges(&mut self, source: &str, target: &str) -> TrellisResult<()> {
        self.validate_exists(source)?;
        self.validate_exists(target)?;
        if let Some(adjacency) = self.nodes.get_mut(source) {
            adjacency.remove(target);
        }
        Ok(())
    }

    /// Shortest directed distance from `source` to `target`, or `None` when
    /// unreachable. Both endpoints must exist.
    pub fn shortest_path(&self, source: &str, target: &str) -> TrellisResult<Option<Weight>> {
        self.validate_exists(source)?;
        self.validate_exists(target)?;
        Ok(dijkstra::shortest_path(self, source, target))
    }

    /// Nodes other than `source` within a strict distance bound, including
    /// intermediates on the qualifying shortest paths. Unsorted; display
    /// ordering belongs to the protocol layer.
    pub fn closer_than(&self, threshold: Weight, source: &str) -> TrellisResult<Vec<NodeName>> {
        self.validate_exists(source)?;
        Ok(dijkstra::closer_than(self, threshold, source))
    }

    fn validate_exists(&self, name: &str) -> TrellisResult<()> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(TrellisError::NodeNotFound(NodeName::from(name)))
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
