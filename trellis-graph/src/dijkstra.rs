//! Single-source shortest paths over the graph store.
//!
//! Every query runs a full Dijkstra pass from scratch; nothing is cached
//! between calls, and the records never leave this module. Alongside each
//! node's distance the pass records the set of nodes lying on some shortest
//! path to it, which `closer_than` needs for its union semantics.

use std::collections::{HashMap, HashSet};

use trellis_core::types::{NodeName, Weight};

use crate::store::GraphStore;

/// Sentinel distance for a node not yet reached.
const INFINITE: Weight = Weight::MAX;

/// Per-node state of one resolver run.
#[derive(Debug, Clone)]
struct PathRecord {
    distance: Weight,
    on_path: HashSet<NodeName>,
}

impl PathRecord {
    fn unreached() -> Self {
        Self {
            distance: INFINITE,
            on_path: HashSet::new(),
        }
    }
}

/// Distance of the shortest directed path, or `None` when `target` is not
/// reachable from `source`. The sentinel never escapes this module.
pub fn shortest_path(store: &GraphStore, source: &str, target: &str) -> Option<Weight> {
    let records = resolve(store, source);
    records
        .get(target)
        .map(|record| record.distance)
        .filter(|&distance| distance != INFINITE)
}

/// Nodes other than `source` whose resolved distance is strictly below
/// `threshold`, unioned with every node (other than `source`) on those
/// nodes' shortest paths. Unsorted and deduplicated.
pub fn closer_than(store: &GraphStore, threshold: Weight, source: &str) -> Vec<NodeName> {
    let records = resolve(store, source);
    let mut result: HashSet<NodeName> = HashSet::new();
    for (name, record) in &records {
        if record.distance < threshold && name.as_str() != source {
            result.insert(name.clone());
            result.extend(
                record
                    .on_path
                    .iter()
                    .filter(|on_path| on_path.as_str() != source)
                    .cloned(),
            );
        }
    }
    result.into_iter().collect()
}

/// Run Dijkstra from `source`, producing a record for every node in the
/// store. The frontier scan only ever selects finite-distance nodes and
/// relaxation uses checked addition, so the sentinel can never wrap into a
/// spuriously short distance.
fn resolve(store: &GraphStore, source: &str) -> HashMap<NodeName, PathRecord> {
    let mut records: HashMap<NodeName, PathRecord> = store
        .node_names()
        .map(|name| {
            let mut record = PathRecord::unreached();
            if name.as_str() == source {
                record.distance = 0;
            }
            (name.clone(), record)
        })
        .collect();

    let mut settled: HashSet<NodeName> = HashSet::new();
    let mut unsettled: HashSet<NodeName> = HashSet::new();
    unsettled.insert(NodeName::from(source));

    while let Some(current) = nearest_unsettled(&unsettled, &records) {
        unsettled.remove(&current);
        let through = match records.get(&current) {
            Some(record) => record.clone(),
            None => continue,
        };
        if let Some(adjacency) = store.adjacency(&current) {
            for (adjacent, weights) in adjacency {
                if settled.contains(adjacent) {
                    continue;
                }
                for &weight in weights {
                    relax(&mut records, &through, &current, adjacent, weight);
                }
                unsettled.insert(adjacent.clone());
            }
        }
        settled.insert(current);
    }

    records
}

/// Frontier member with the smallest finite distance, ties broken by
/// whichever is encountered first.
fn nearest_unsettled(
    unsettled: &HashSet<NodeName>,
    records: &HashMap<NodeName, PathRecord>,
) -> Option<NodeName> {
    let mut nearest: Option<(&NodeName, Weight)> = None;
    for name in unsettled {
        let distance = match records.get(name) {
            Some(record) => record.distance,
            None => continue,
        };
        if distance == INFINITE {
            continue;
        }
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((name, distance)),
        }
    }
    nearest.map(|(name, _)| name.clone())
}

/// Relax `adjacent` through `through_name`: on improvement, the adjacent
/// node inherits the predecessor's path set plus the predecessor itself.
fn relax(
    records: &mut HashMap<NodeName, PathRecord>,
    through: &PathRecord,
    through_name: &NodeName,
    adjacent: &NodeName,
    weight: Weight,
) {
    let candidate = match through.distance.checked_add(weight) {
        Some(candidate) => candidate,
        None => return,
    };
    if let Some(record) = records.get_mut(adjacent) {
        if candidate < record.distance {
            record.distance = candidate;
            record.on_path = through.on_path.clone();
            record.on_path.insert(through_name.clone());
        }
    }
}
