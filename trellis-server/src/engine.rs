//! The Trellis engine: the process-wide graph store behind one lock.
//!
//! Constructed once in `main` and shared with every session as an
//! `Arc<Engine>` -- plain static composition, no runtime lookup.

use parking_lot::RwLock;

use trellis_core::config::TrellisConfig;
use trellis_core::error::{TrellisError, TrellisResult};
use trellis_core::types::{NodeName, Weight};
use trellis_graph::store::GraphStore;
use trellis_proto::command::Command;

/// Response from executing a graph command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResponse {
    NodeAdded,
    NodeRemoved,
    EdgeAdded,
    EdgeRemoved,
    Weight(Weight),
    Unreachable,
    Nodes(Vec<NodeName>),
}

/// The shared engine. Mutations hold the write lock for the existence
/// check and the guarded mutation as one unit; resolver queries hold the
/// read lock for the whole traversal and therefore see a consistent
/// snapshot of the graph.
pub struct Engine {
    store: RwLock<GraphStore>,
    config: TrellisConfig,
}

impl Engine {
    pub fn new(config: TrellisConfig) -> Self {
        Self {
            store: RwLock::new(GraphStore::new()),
            config,
        }
    }

    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Execute one graph command. Session-scoped commands (`Greet`, `Bye`)
    /// and unrecognized lines are answered by the session layer and never
    /// reach the store.
    pub fn execute(&self, command: Command) -> TrellisResult<CommandResponse> {
        match command {
            Command::AddNode { name } => {
                self.store.write().add_node(name)?;
                Ok(CommandResponse::NodeAdded)
            }
            Command::RemoveNode { name } => {
                self.store.write().remove_node(&name)?;
                Ok(CommandResponse::NodeRemoved)
            }
            Command::AddEdge {
                source,
                target,
                weight,
            } => {
                self.store.write().add_edge(&source, &target, weight)?;
                Ok(CommandResponse::EdgeAdded)
            }
            Command::RemoveEdge { source, target } => {
                self.store.write().remove_edges(&source, &target)?;
                Ok(CommandResponse::EdgeRemoved)
            }
            Command::ShortestPath { source, target } => {
                let distance = self.store.read().shortest_path(&source, &target)?;
                Ok(match distance {
                    Some(weight) => CommandResponse::Weight(weight),
                    None => CommandResponse::Unreachable,
                })
            }
            Command::CloserThan { threshold, source } => {
                let nodes = self.store.read().closer_than(threshold, &source)?;
                Ok(CommandResponse::Nodes(nodes))
            }
            Command::Greet { .. } | Command::Bye | Command::Unrecognized => {
                Err(TrellisError::Protocol("not a graph command".into()))
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.store.read().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.read().edge_count()
    }
}
