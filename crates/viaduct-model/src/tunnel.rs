//! Bandwidth-reserving tunnels
//!
//! A tunnel is a traffic-engineered path with an explicit bandwidth
//! reservation on every interface it transits. Tunnels are signaled in
//! lexicographic name order each convergence pass; an earlier tunnel's
//! reservation is visible to, and can block, a later one.

use std::collections::BTreeSet;

use serde::Serialize;
use viaduct_core::{InterfaceKey, NodeId};

/// Resolved path state of a tunnel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TunnelPath {
    /// No path with enough reservable bandwidth exists
    Unrouted,
    /// Signaled onto an ordered interface sequence
    Routed {
        /// Interfaces in source-to-destination order
        hops: Vec<InterfaceKey>,
        /// Membership set for transit queries
        members: BTreeSet<InterfaceKey>,
    },
}

impl TunnelPath {
    pub(crate) fn routed(hops: Vec<InterfaceKey>) -> Self {
        let members = hops.iter().cloned().collect();
        Self::Routed { hops, members }
    }

    /// The ordered hop sequence, when routed
    pub fn hops(&self) -> Option<&[InterfaceKey]> {
        match self {
            Self::Routed { hops, .. } => Some(hops),
            Self::Unrouted => None,
        }
    }

    /// Whether the tunnel is signaled onto a path
    pub fn is_routed(&self) -> bool {
        matches!(self, Self::Routed { .. })
    }

    /// Whether the path transits `key`
    pub fn transits(&self, key: &InterfaceKey) -> bool {
        match self {
            Self::Routed { members, .. } => members.contains(key),
            Self::Unrouted => false,
        }
    }
}

/// A traffic-engineered tunnel with explicit bandwidth reservation
#[derive(Debug, Clone, Serialize)]
pub struct Tunnel {
    name: String,
    source: NodeId,
    destination: NodeId,
    bandwidth: f64,
    path: TunnelPath,
    /// Bandwidth currently held along `path`, released before re-signaling
    reserved: f64,
}

impl Tunnel {
    pub(crate) fn new(name: String, source: NodeId, destination: NodeId, bandwidth: f64) -> Self {
        Self {
            name,
            source,
            destination,
            bandwidth,
            path: TunnelPath::Unrouted,
            reserved: 0.0,
        }
    }

    /// The tunnel's unique name, also its signaling order
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Head-end node
    pub fn source(&self) -> &NodeId {
        &self.source
    }

    /// Tail-end node
    pub fn destination(&self) -> &NodeId {
        &self.destination
    }

    /// Bandwidth the tunnel signals for
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Resolved path from the last convergence pass
    pub fn path(&self) -> &TunnelPath {
        &self.path
    }

    /// Bandwidth currently reserved along the resolved path
    pub fn reserved(&self) -> f64 {
        self.reserved
    }

    pub(crate) fn set_bandwidth(&mut self, bandwidth: f64) {
        self.bandwidth = bandwidth;
    }

    pub(crate) fn set_path(&mut self, path: TunnelPath) {
        self.path = path;
    }

    pub(crate) fn set_reserved(&mut self, reserved: f64) {
        self.reserved = reserved;
    }

    pub(crate) fn clear_reservation(&mut self) {
        self.reserved = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_starts_unrouted_with_nothing_reserved() {
        let tunnel = Tunnel::new(
            "t1".to_string(),
            NodeId::new("A"),
            NodeId::new("B"),
            60.0,
        );
        assert!(!tunnel.path().is_routed());
        assert_eq!(tunnel.reserved(), 0.0);
    }

    #[test]
    fn test_routed_path_membership() {
        let hops = vec![
            InterfaceKey::new("A", "to-C"),
            InterfaceKey::new("C", "to-B"),
        ];
        let path = TunnelPath::routed(hops.clone());
        assert_eq!(path.hops(), Some(hops.as_slice()));
        assert!(path.transits(&InterfaceKey::new("C", "to-B")));
        assert!(!path.transits(&InterfaceKey::new("B", "to-C")));
    }

    #[test]
    fn test_unrouted_transits_nothing() {
        let path = TunnelPath::Unrouted;
        assert_eq!(path.hops(), None);
        assert!(!path.transits(&InterfaceKey::new("A", "x")));
    }
}
