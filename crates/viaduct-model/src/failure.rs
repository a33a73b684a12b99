//! Failure propagation
//!
//! Interfaces and nodes are two-state machines (up, failed) with
//! cascading rules: an interface fails together with its circuit peer,
//! a node takes every interface it owns down with it, and an SRLG
//! applies those rules to all of its members as one action. Nothing
//! here re-routes traffic; the next convergence pass does.

use tracing::{debug, warn};
use viaduct_core::{InterfaceKey, NodeId};

use crate::error::{ModelError, ModelResult};
use crate::model::Model;

impl Model {
    /// Fail an interface and its circuit peer
    ///
    /// Always succeeds on a known interface. Reservations on both sides
    /// are dropped; tunnels holding them keep their stale paths until
    /// the next convergence pass recomputes them.
    pub fn fail_interface(&mut self, key: &InterfaceKey) -> ModelResult<()> {
        let peer_key = self.remote_interface(key)?.key();
        self.interface_mut(key)?.set_failed(true);
        self.interface_mut(&peer_key)?.set_failed(true);
        debug!("Interface {} failed (with peer {})", key, peer_key);
        Ok(())
    }

    /// Recover an interface and its circuit peer
    ///
    /// Refused while either endpoint node is failed; an interface cannot
    /// be up on a failed node. State is untouched on refusal.
    pub fn unfail_interface(&mut self, key: &InterfaceKey) -> ModelResult<()> {
        let peer_key = self.remote_interface(key)?.key();
        for node in [key.node(), peer_key.node()] {
            if self.node_failed(node) {
                return Err(ModelError::InvalidOperation(format!(
                    "cannot unfail {key}: node {node} is failed"
                )));
            }
        }
        self.interface_mut(key)?.set_failed(false);
        self.interface_mut(&peer_key)?.set_failed(false);
        debug!("Interface {} recovered (with peer {})", key, peer_key);
        Ok(())
    }

    /// Fail a node and every interface it owns
    pub fn fail_node(&mut self, name: &NodeId) -> ModelResult<()> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| ModelError::unknown("node", name.as_str()))?
            .set_failed(true);
        let owned: Vec<InterfaceKey> = self
            .interfaces
            .values()
            .filter(|interface| interface.node() == name)
            .map(|interface| interface.key())
            .collect();
        for key in &owned {
            self.fail_interface(key)?;
        }
        debug!("Node {} failed ({} owned interface(s) dropped)", name, owned.len());
        Ok(())
    }

    /// Recover a node
    ///
    /// Clears only the node's flag: its interfaces stay failed until
    /// explicitly unfailed, which this recovery permits but does not
    /// force.
    pub fn unfail_node(&mut self, name: &NodeId) -> ModelResult<()> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| ModelError::unknown("node", name.as_str()))?
            .set_failed(false);
        debug!("Node {} recovered; its interfaces remain failed until unfailed", name);
        Ok(())
    }

    /// Fail every member of a shared-risk group as one action
    pub fn fail_srlg(&mut self, name: &str) -> ModelResult<()> {
        let group = self
            .srlgs
            .get(name)
            .ok_or_else(|| ModelError::unknown("srlg", name))?;
        let nodes: Vec<NodeId> = group.nodes().iter().cloned().collect();
        let interfaces: Vec<InterfaceKey> = group.interfaces().iter().cloned().collect();
        for node in &nodes {
            self.fail_node(node)?;
        }
        for key in &interfaces {
            self.fail_interface(key)?;
        }
        debug!(
            "SRLG {} failed: {} node(s), {} interface(s)",
            name,
            nodes.len(),
            interfaces.len()
        );
        Ok(())
    }

    /// Attempt to recover every member of a shared-risk group
    ///
    /// Member nodes recover first so member interfaces between them can
    /// come back in the same call. Interfaces whose endpoint node is
    /// still failed outside the group stay down and are surfaced in one
    /// `InvalidOperation` after the best-effort pass.
    pub fn unfail_srlg(&mut self, name: &str) -> ModelResult<()> {
        let group = self
            .srlgs
            .get(name)
            .ok_or_else(|| ModelError::unknown("srlg", name))?;
        let nodes: Vec<NodeId> = group.nodes().iter().cloned().collect();
        let interfaces: Vec<InterfaceKey> = group.interfaces().iter().cloned().collect();
        for node in &nodes {
            self.unfail_node(node)?;
        }
        let mut stuck = Vec::new();
        for key in &interfaces {
            match self.unfail_interface(key) {
                Ok(()) => {}
                Err(ModelError::InvalidOperation(_)) => stuck.push(key.to_string()),
                Err(other) => return Err(other),
            }
        }
        if !stuck.is_empty() {
            warn!(
                "SRLG {} recovery left {} interface(s) down: {}",
                name,
                stuck.len(),
                stuck.join(", ")
            );
            return Err(ModelError::InvalidOperation(format!(
                "srlg {} members could not be unfailed: {}",
                name,
                stuck.join(", ")
            )));
        }
        debug!("SRLG {} recovered", name);
        Ok(())
    }
}
