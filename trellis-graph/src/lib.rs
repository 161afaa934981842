//! The Trellis graph engine: the multigraph store and the Dijkstra-based
//! shortest-path resolver that runs over it.

pub mod dijkstra;
pub mod store;
