//! Network nodes

use serde::Serialize;
use viaduct_core::NodeId;

/// A node in the modeled topology
///
/// Owns no interfaces directly; interfaces reference their owning node
/// by id and live in the model's interface arena. The failed flag only
/// mutates through the model's failure operations.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    name: NodeId,
    failed: bool,
}

impl Node {
    pub(crate) fn new(name: NodeId) -> Self {
        Self {
            name,
            failed: false,
        }
    }

    /// The node's unique name
    pub fn name(&self) -> &NodeId {
        &self.name
    }

    /// Whether the node is failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }
}
