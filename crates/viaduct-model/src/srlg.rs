//! Shared-risk groups
//!
//! An SRLG names interfaces and nodes that share a failure domain (a
//! common conduit, line card, or site) and therefore fail and recover
//! as one unit.

use std::collections::BTreeSet;

use serde::Serialize;
use viaduct_core::{InterfaceKey, NodeId};

/// A named set of interfaces and nodes that fail together
#[derive(Debug, Clone, Serialize)]
pub struct Srlg {
    name: String,
    interfaces: BTreeSet<InterfaceKey>,
    nodes: BTreeSet<NodeId>,
}

impl Srlg {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            interfaces: BTreeSet::new(),
            nodes: BTreeSet::new(),
        }
    }

    /// The group's unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member interfaces
    pub fn interfaces(&self) -> &BTreeSet<InterfaceKey> {
        &self.interfaces
    }

    /// Member nodes
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.nodes.is_empty()
    }

    pub(crate) fn insert_interface(&mut self, key: InterfaceKey) {
        self.interfaces.insert(key);
    }

    pub(crate) fn insert_node(&mut self, node: NodeId) {
        self.nodes.insert(node);
    }

    pub(crate) fn references_interface(&self, key: &InterfaceKey) -> bool {
        self.interfaces.contains(key)
    }

    pub(crate) fn references_node(&self, node: &NodeId) -> bool {
        self.nodes.contains(node) || self.interfaces.iter().any(|key| key.node() == node)
    }
}
