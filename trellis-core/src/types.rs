//! Core type definitions for Trellis.

use compact_str::CompactString;

/// A node identifier as it appears on the wire: a short token matching
/// `[A-Za-z0-9/-]+`.
pub type NodeName = CompactString;

/// Weight of a single directed edge (non-negative).
pub type Weight = u64;

/// A duration in milliseconds, as reported in session farewells.
pub type Millis = u64;
