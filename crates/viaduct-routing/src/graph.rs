//! Link snapshots handed to the path finder
//!
//! The model flattens its live (non-failed) interfaces into directed
//! [`Link`] values before every search. The finder never sees topology
//! objects, only this snapshot, so search state cannot leak back into
//! the store.

use serde::{Deserialize, Serialize};
use viaduct_core::{InterfaceKey, NodeId};

/// One directed edge of the search graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Node traffic egresses from
    pub from: NodeId,
    /// Node at the far end of the circuit
    pub to: NodeId,
    /// Interface the edge was snapshotted from
    pub interface: InterfaceKey,
    /// Cost of traversing the interface
    pub cost: f64,
    /// Headroom available for new tunnel reservations
    pub reservable: f64,
}

impl Link {
    /// Build a link; `interface` is keyed on the `from` node
    pub fn new(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        name: impl Into<String>,
        cost: f64,
        reservable: f64,
    ) -> Self {
        let from = from.into();
        Self {
            interface: InterfaceKey::new(from.clone(), name),
            from,
            to: to.into(),
            cost,
            reservable,
        }
    }
}
