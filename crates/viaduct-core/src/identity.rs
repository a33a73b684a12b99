//! Identity keys for topology entities
//!
//! Nodes and interfaces are stored in keyed arenas and referenced by
//! these value keys rather than by object references. The keys carry
//! only configuration-time identity, so equality, ordering, and hashing
//! stay stable while simulation state (traffic, reservations, failure
//! flags) mutates underneath them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node: its configured name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The node name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identity key for an interface: (owning node, interface name)
///
/// An interface belongs to exactly one node, and its name is unique on
/// that node, so the pair identifies it across the whole model. The key
/// never changes after the interface is built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterfaceKey {
    node: NodeId,
    name: String,
}

impl InterfaceKey {
    /// Create an interface key from the owning node and interface name
    pub fn new(node: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            name: name.into(),
        }
    }

    /// The owning node
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// The interface name, unique per owning node
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.name)
    }
}
