//! Traffic demands
//!
//! A demand is a configured volume of traffic between two nodes. Where
//! that volume lands is recomputed from scratch every convergence pass:
//! onto a tunnel with matching endpoints, split across the equal-cost
//! path set, or nowhere at all.

use std::fmt;

use serde::Serialize;
use viaduct_core::{InterfaceKey, NodeId};

/// Identity of a demand: endpoints plus a caller-chosen name
///
/// The name lets parallel demands coexist between one node pair; the
/// full triple is the deterministic placement order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DemandKey {
    pub source: NodeId,
    pub destination: NodeId,
    pub name: String,
}

impl DemandKey {
    /// Build a demand key
    pub fn new(
        source: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DemandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.source, self.destination, self.name)
    }
}

/// Where a demand's traffic currently lands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DemandPath {
    /// No feasible path under the current topology
    Unrouted,
    /// Volume split evenly across these equal-cost interface sequences
    Ecmp(Vec<Vec<InterfaceKey>>),
    /// Full volume rides the named tunnel
    Tunnel(String),
}

impl DemandPath {
    /// Whether the demand currently has no path
    pub fn is_unrouted(&self) -> bool {
        matches!(self, Self::Unrouted)
    }
}

/// A unidirectional traffic demand between two nodes
#[derive(Debug, Clone, Serialize)]
pub struct Demand {
    key: DemandKey,
    volume: f64,
    path: DemandPath,
}

impl Demand {
    pub(crate) fn new(key: DemandKey, volume: f64) -> Self {
        Self {
            key,
            volume,
            path: DemandPath::Unrouted,
        }
    }

    /// The demand's identity
    pub fn key(&self) -> &DemandKey {
        &self.key
    }

    /// Source node
    pub fn source(&self) -> &NodeId {
        &self.key.source
    }

    /// Destination node
    pub fn destination(&self) -> &NodeId {
        &self.key.destination
    }

    /// Configured traffic volume
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Resolved path from the last convergence pass
    pub fn path(&self) -> &DemandPath {
        &self.path
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub(crate) fn set_path(&mut self, path: DemandPath) {
        self.path = path;
    }
}
