//! Command grammar for the Trellis line protocol.
//!
//! A single parse step turns one complete line into a `Command`, with
//! `Unrecognized` as the fallback variant -- there is no per-candidate
//! pattern scan. Matching is anchored and case-sensitive: the whole line
//! must be exactly one well-formed command. A line carrying two commands'
//! worth of text, stray tokens, or an identifier outside `[A-Za-z0-9/-]+`
//! is unrecognized.
//!
//! The outbound formatting helpers live here too, so the wire vocabulary
//! stays in one place.

use trellis_core::error::TrellisError;
use trellis_core::types::{Millis, NodeName, Weight};

/// Response to any line that is not exactly one well-formed command.
pub const SORRY: &str = "SORRY, I DID NOT UNDERSTAND THAT";

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HI, I AM <name>` -- the client declares its name.
    Greet { name: NodeName },
    /// `BYE MATE!` -- the client ends the session.
    Bye,
    /// `ADD NODE <id>`
    AddNode { name: NodeName },
    /// `REMOVE NODE <id>`
    RemoveNode { name: NodeName },
    /// `ADD EDGE <src> <dst> <weight>`
    AddEdge {
        source: NodeName,
        target: NodeName,
        weight: Weight,
    },
    /// `REMOVE EDGE <src> <dst>`
    RemoveEdge { source: NodeName, target: NodeName },
    /// `SHORTEST PATH <src> <dst>`
    ShortestPath { source: NodeName, target: NodeName },
    /// `CLOSER THAN <weight> <src>`
    CloserThan { threshold: Weight, source: NodeName },
    /// Anything else.
    Unrecognized,
}

/// Parse one complete line (terminator already stripped) into a `Command`.
pub fn parse_line(line: &str) -> Command {
    let tokens: Vec<&str> = line.split(' ').collect();
    match tokens.as_slice() {
        ["HI,", "I", "AM", name] if is_node_name(name) => Command::Greet {
            name: NodeName::from(*name),
        },
        ["BYE", "MATE!"] => Command::Bye,
        ["ADD", "NODE", name] if is_node_name(name) => Command::AddNode {
            name: NodeName::from(*name),
        },
        ["REMOVE", "NODE", name] if is_node_name(name) => Command::RemoveNode {
            name: NodeName::from(*name),
        },
        ["ADD", "EDGE", source, target, weight]
            if is_node_name(source) && is_node_name(target) =>
        {
            match parse_weight(weight) {
                Some(weight) => Command::AddEdge {
                    source: NodeName::from(*source),
                    target: NodeName::from(*target),
                    weight,
                },
                None => Command::Unrecognized,
            }
        }
        ["REMOVE", "EDGE", source, target] if is_node_name(source) && is_node_name(target) => {
            Command::RemoveEdge {
                source: NodeName::from(*source),
                target: NodeName::from(*target),
            }
        }
        ["SHORTEST", "PATH", source, target] if is_node_name(source) && is_node_name(target) => {
            Command::ShortestPath {
                source: NodeName::from(*source),
                target: NodeName::from(*target),
            }
        }
        ["CLOSER", "THAN", threshold, source] if is_node_name(source) => {
            match parse_weight(threshold) {
                Some(threshold) => Command::CloserThan {
                    threshold,
                    source: NodeName::from(*source),
                },
                None => Command::Unrecognized,
            }
        }
        _ => Command::Unrecognized,
    }
}

fn is_node_name(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '-')
}

fn parse_weight(token: &str) -> Option<Weight> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

// ---- Outbound lines ---------------------------------------------------------

/// Unsolicited greeting sent the moment a connection becomes active.
pub fn greeting_line(session_id: &str) -> String {
    format!("HI, I AM {session_id}")
}

/// Reply to a client's `HI, I AM <name>`.
pub fn hi_line(name: &str) -> String {
    format!("HI {name}")
}

/// Farewell carrying the declared client name (possibly empty) and the
/// session duration. Sent for both `BYE MATE!` and the inactivity timeout.
pub fn farewell_line(name: &str, elapsed: Millis) -> String {
    format!("BYE {name}, WE SPOKE FOR {elapsed} MS")
}

/// Map a dispatch error to its wire line. The session stays active after
/// any of these.
pub fn error_line(err: &TrellisError) -> String {
    match err {
        TrellisError::NodeNotFound(_) => "ERROR: NODE NOT FOUND".to_string(),
        TrellisError::NodeAlreadyExists(_) => "ERROR: NODE ALREADY EXISTS".to_string(),
        other => format!("ERROR: {other}"),
    }
}

/// Sort lexicographically and comma-join node names for display, per the
/// `CLOSER THAN` response. An empty set renders as an empty line.
pub fn node_list_line(mut names: Vec<NodeName>) -> String {
    names.sort();
    names.join(",")
}
