//! The topology store and its mutation boundary
//!
//! All entities live in keyed arenas here, and every mutation of
//! failure, traffic, or reservation state routes through [`Model`]
//! methods so the store's invariants are enforced at one boundary.
//! Arenas are ordered maps: iteration order is identity order, which is
//! what makes signaling and placement replays reproducible.

use std::collections::BTreeMap;

use serde::Serialize;
use viaduct_core::{InterfaceKey, NodeId};

use crate::circuit::Circuit;
use crate::demand::{Demand, DemandKey, DemandPath};
use crate::error::{ModelError, ModelResult};
use crate::interface::{validate_capacity, validate_cost, Interface};
use crate::node::Node;
use crate::srlg::Srlg;
use crate::tunnel::Tunnel;

/// Bounds for the convergence loop and path enumeration
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceConfig {
    /// Maximum convergence passes before giving up
    pub max_passes: usize,
    /// Maximum equal-cost paths enumerated per query
    pub max_ecmp_paths: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_passes: 10,
            max_ecmp_paths: 64,
        }
    }
}

/// One side of a circuit, as handed to [`Model::add_circuit`]
#[derive(Debug, Clone)]
pub struct InterfaceSpec {
    pub node: NodeId,
    pub name: String,
    pub cost: f64,
    pub capacity: f64,
}

impl InterfaceSpec {
    /// Build a spec for one circuit side
    pub fn new(
        node: impl Into<NodeId>,
        name: impl Into<String>,
        cost: f64,
        capacity: f64,
    ) -> Self {
        Self {
            node: node.into(),
            name: name.into(),
            cost,
            capacity,
        }
    }
}

/// The capacity-planning model: topology, demands, tunnels, SRLGs
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) interfaces: BTreeMap<InterfaceKey, Interface>,
    pub(crate) circuits: BTreeMap<u32, Circuit>,
    pub(crate) demands: BTreeMap<DemandKey, Demand>,
    pub(crate) tunnels: BTreeMap<String, Tunnel>,
    pub(crate) srlgs: BTreeMap<String, Srlg>,
    pub(crate) config: ConvergenceConfig,
}

impl Model {
    /// An empty model with default convergence bounds
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty model with explicit convergence bounds
    pub fn with_config(config: ConvergenceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The convergence bounds in effect
    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    // --- nodes ---

    /// Add a node
    pub fn add_node(&mut self, name: impl Into<NodeId>) -> ModelResult<()> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(ModelError::InvalidConfiguration(format!(
                "node {name} already exists"
            )));
        }
        self.nodes.insert(name.clone(), Node::new(name));
        Ok(())
    }

    /// Remove a node; refused while anything still references it
    pub fn remove_node(&mut self, name: &NodeId) -> ModelResult<()> {
        if !self.nodes.contains_key(name) {
            return Err(ModelError::unknown("node", name.as_str()));
        }
        if self.interfaces.values().any(|i| i.node() == name || i.remote_node() == name) {
            return Err(ModelError::InvalidOperation(format!(
                "node {name} still terminates circuits"
            )));
        }
        if self
            .demands
            .keys()
            .any(|key| &key.source == name || &key.destination == name)
        {
            return Err(ModelError::InvalidOperation(format!(
                "node {name} is still a demand endpoint"
            )));
        }
        if self
            .tunnels
            .values()
            .any(|t| t.source() == name || t.destination() == name)
        {
            return Err(ModelError::InvalidOperation(format!(
                "node {name} is still a tunnel endpoint"
            )));
        }
        if self.srlgs.values().any(|g| g.references_node(name)) {
            return Err(ModelError::InvalidOperation(format!(
                "node {name} is still an SRLG member"
            )));
        }
        self.nodes.remove(name);
        Ok(())
    }

    /// Look up a node
    pub fn node(&self, name: &NodeId) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// All nodes, in name order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    // --- circuits and interfaces ---

    /// Add a circuit: two paired opposite-direction interfaces
    ///
    /// Both endpoint nodes must already exist. With `address: None` the
    /// next free address is assigned. Parallel circuits between one node
    /// pair are allowed; each gets its own address. Returns the address.
    pub fn add_circuit(
        &mut self,
        a: InterfaceSpec,
        b: InterfaceSpec,
        address: Option<u32>,
    ) -> ModelResult<u32> {
        if a.node == b.node {
            return Err(ModelError::InvalidConfiguration(format!(
                "circuit endpoints must differ, got {} on both sides",
                a.node
            )));
        }
        for side in [&a, &b] {
            if !self.nodes.contains_key(&side.node) {
                return Err(ModelError::unknown("node", side.node.as_str()));
            }
            validate_cost(side.cost)?;
            validate_capacity(side.capacity)?;
            let key = InterfaceKey::new(side.node.clone(), side.name.clone());
            if self.interfaces.contains_key(&key) {
                return Err(ModelError::InvalidConfiguration(format!(
                    "interface {key} already exists"
                )));
            }
        }
        let address = match address {
            Some(address) => {
                if self.circuits.contains_key(&address) {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "circuit address {address} already in use"
                    )));
                }
                address
            }
            None => self.next_free_address(),
        };

        let key_a = InterfaceKey::new(a.node.clone(), a.name.clone());
        let key_b = InterfaceKey::new(b.node.clone(), b.name.clone());
        let mut side_a = Interface::new(a.node.clone(), a.name, b.node.clone(), address, a.cost, a.capacity)?;
        let mut side_b = Interface::new(b.node.clone(), b.name, a.node.clone(), address, b.cost, b.capacity)?;
        // A circuit added while an endpoint node is failed comes up failed
        if self.node_failed(&a.node) || self.node_failed(&b.node) {
            side_a.set_failed(true);
            side_b.set_failed(true);
        }
        self.interfaces.insert(key_a.clone(), side_a);
        self.interfaces.insert(key_b.clone(), side_b);
        self.circuits.insert(address, Circuit::new(address, key_a, key_b));
        Ok(address)
    }

    /// Remove a circuit and both of its interfaces
    pub fn remove_circuit(&mut self, address: u32) -> ModelResult<()> {
        let Some(circuit) = self.circuits.get(&address) else {
            return Err(ModelError::unknown("circuit", address.to_string()));
        };
        let (a, b) = circuit.sides();
        for key in [a, b] {
            if self.srlgs.values().any(|g| g.references_interface(key)) {
                return Err(ModelError::InvalidOperation(format!(
                    "interface {key} is still an SRLG member"
                )));
            }
        }
        let (a, b) = (a.clone(), b.clone());
        self.interfaces.remove(&a);
        self.interfaces.remove(&b);
        self.circuits.remove(&address);
        Ok(())
    }

    /// Look up a circuit by address
    pub fn circuit(&self, address: u32) -> Option<&Circuit> {
        self.circuits.get(&address)
    }

    /// The circuit an interface is one side of
    pub fn circuit_of(&self, key: &InterfaceKey) -> ModelResult<&Circuit> {
        let interface = self
            .interfaces
            .get(key)
            .ok_or_else(|| ModelError::unknown("interface", key.to_string()))?;
        self.circuits.get(&interface.address()).ok_or_else(|| {
            ModelError::Integrity(format!(
                "interface {key} has no circuit at address {}",
                interface.address()
            ))
        })
    }

    /// All circuits, in address order
    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    /// Look up an interface
    pub fn interface(&self, key: &InterfaceKey) -> Option<&Interface> {
        self.interfaces.get(key)
    }

    /// All interfaces, in identity-key order
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    /// Set an interface's cost; `InvalidConfiguration` below 1
    pub fn set_interface_cost(&mut self, key: &InterfaceKey, cost: f64) -> ModelResult<()> {
        self.interface_mut(key)?.set_cost(cost)
    }

    /// Set an interface's capacity; `InvalidConfiguration` at or below 0
    pub fn set_interface_capacity(&mut self, key: &InterfaceKey, capacity: f64) -> ModelResult<()> {
        self.interface_mut(key)?.set_capacity(capacity)
    }

    /// The paired interface on the remote node, sharing this one's address
    ///
    /// Fails with an integrity error when the pairing does not resolve
    /// back to the querying interface's node: that means the topology
    /// input was malformed, not that a search failed.
    pub fn remote_interface(&self, key: &InterfaceKey) -> ModelResult<&Interface> {
        let interface = self
            .interfaces
            .get(key)
            .ok_or_else(|| ModelError::unknown("interface", key.to_string()))?;
        let circuit = self.circuits.get(&interface.address()).ok_or_else(|| {
            ModelError::Integrity(format!(
                "interface {key} has no circuit at address {}",
                interface.address()
            ))
        })?;
        let peer_key = circuit.peer_of(key).ok_or_else(|| {
            ModelError::Integrity(format!(
                "circuit {} does not list {key} as a side",
                interface.address()
            ))
        })?;
        let peer = self.interfaces.get(peer_key).ok_or_else(|| {
            ModelError::Integrity(format!("paired interface {peer_key} is missing"))
        })?;
        if peer.remote_node() != key.node()
            || interface.remote_node() != peer_key.node()
            || peer.address() != interface.address()
        {
            return Err(ModelError::Integrity(format!(
                "interfaces {key} and {peer_key} fail pairing validation"
            )));
        }
        Ok(peer)
    }

    /// Whole-model integrity sweep
    ///
    /// Checks circuit pairing for every interface plus the reservation
    /// invariants: reservations within capacity, failed interfaces
    /// carrying no reservation and the down marker.
    pub fn validate(&self) -> ModelResult<()> {
        let keys: Vec<InterfaceKey> = self.interfaces.keys().cloned().collect();
        for key in &keys {
            self.remote_interface(key)?;
        }
        for interface in self.interfaces.values() {
            let reserved = interface.reserved_bandwidth();
            if reserved < 0.0 || reserved > interface.capacity() {
                return Err(ModelError::Integrity(format!(
                    "interface {} reserves {} outside [0, {}]",
                    interface.key(),
                    reserved,
                    interface.capacity()
                )));
            }
            if interface.failed() && (reserved != 0.0 || !interface.traffic().is_down()) {
                return Err(ModelError::Integrity(format!(
                    "failed interface {} still carries reservation or load",
                    interface.key()
                )));
            }
        }
        Ok(())
    }

    // --- demands ---

    /// Add a demand; endpoints must exist and volume must be positive
    pub fn add_demand(
        &mut self,
        source: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        volume: f64,
        name: impl Into<String>,
    ) -> ModelResult<DemandKey> {
        let key = DemandKey::new(source, destination, name);
        self.check_endpoints(&key.source, &key.destination)?;
        validate_volume(volume, "demand volume")?;
        if self.demands.contains_key(&key) {
            return Err(ModelError::InvalidConfiguration(format!(
                "demand {key} already exists"
            )));
        }
        self.demands.insert(key.clone(), Demand::new(key.clone(), volume));
        Ok(key)
    }

    /// Change a demand's volume
    pub fn set_demand_volume(&mut self, key: &DemandKey, volume: f64) -> ModelResult<()> {
        validate_volume(volume, "demand volume")?;
        self.demands
            .get_mut(key)
            .ok_or_else(|| ModelError::unknown("demand", key.to_string()))?
            .set_volume(volume);
        Ok(())
    }

    /// Remove a demand
    pub fn remove_demand(&mut self, key: &DemandKey) -> ModelResult<()> {
        self.demands
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ModelError::unknown("demand", key.to_string()))
    }

    /// Look up a demand
    pub fn demand(&self, key: &DemandKey) -> Option<&Demand> {
        self.demands.get(key)
    }

    /// All demands, in identity order
    pub fn demands(&self) -> impl Iterator<Item = &Demand> {
        self.demands.values()
    }

    // --- tunnels ---

    /// Add a tunnel; endpoints must exist and bandwidth must not be negative
    pub fn add_tunnel(
        &mut self,
        name: impl Into<String>,
        source: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        bandwidth: f64,
    ) -> ModelResult<()> {
        let name = name.into();
        let (source, destination) = (source.into(), destination.into());
        self.check_endpoints(&source, &destination)?;
        validate_bandwidth(bandwidth)?;
        if self.tunnels.contains_key(&name) {
            return Err(ModelError::InvalidConfiguration(format!(
                "tunnel {name} already exists"
            )));
        }
        self.tunnels
            .insert(name.clone(), Tunnel::new(name, source, destination, bandwidth));
        Ok(())
    }

    /// Change a tunnel's signaled bandwidth
    pub fn set_tunnel_bandwidth(&mut self, name: &str, bandwidth: f64) -> ModelResult<()> {
        validate_bandwidth(bandwidth)?;
        self.tunnels
            .get_mut(name)
            .ok_or_else(|| ModelError::unknown("tunnel", name))?
            .set_bandwidth(bandwidth);
        Ok(())
    }

    /// Remove a tunnel
    pub fn remove_tunnel(&mut self, name: &str) -> ModelResult<()> {
        self.release_tunnel(name);
        self.tunnels
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ModelError::unknown("tunnel", name))
    }

    /// Look up a tunnel
    pub fn tunnel(&self, name: &str) -> Option<&Tunnel> {
        self.tunnels.get(name)
    }

    /// All tunnels, in name order
    pub fn tunnels(&self) -> impl Iterator<Item = &Tunnel> {
        self.tunnels.values()
    }

    // --- SRLGs ---

    /// Add an empty shared-risk group
    pub fn add_srlg(&mut self, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        if self.srlgs.contains_key(&name) {
            return Err(ModelError::InvalidConfiguration(format!(
                "srlg {name} already exists"
            )));
        }
        self.srlgs.insert(name.clone(), Srlg::new(name));
        Ok(())
    }

    /// Remove a shared-risk group
    pub fn remove_srlg(&mut self, name: &str) -> ModelResult<()> {
        self.srlgs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ModelError::unknown("srlg", name))
    }

    /// Add an interface to a group
    pub fn srlg_add_interface(&mut self, name: &str, key: &InterfaceKey) -> ModelResult<()> {
        if !self.interfaces.contains_key(key) {
            return Err(ModelError::unknown("interface", key.to_string()));
        }
        self.srlgs
            .get_mut(name)
            .ok_or_else(|| ModelError::unknown("srlg", name))?
            .insert_interface(key.clone());
        Ok(())
    }

    /// Add a node to a group
    pub fn srlg_add_node(&mut self, name: &str, node: &NodeId) -> ModelResult<()> {
        if !self.nodes.contains_key(node) {
            return Err(ModelError::unknown("node", node.as_str()));
        }
        self.srlgs
            .get_mut(name)
            .ok_or_else(|| ModelError::unknown("srlg", name))?
            .insert_node(node.clone());
        Ok(())
    }

    /// Look up a group
    pub fn srlg(&self, name: &str) -> Option<&Srlg> {
        self.srlgs.get(name)
    }

    /// All groups, in name order
    pub fn srlgs(&self) -> impl Iterator<Item = &Srlg> {
        self.srlgs.values()
    }

    // --- reverse lookups ---

    /// Demands whose resolved path transits `key`, including demands
    /// riding a tunnel over it
    pub fn demands_transiting(&self, key: &InterfaceKey) -> Vec<&Demand> {
        self.demands
            .values()
            .filter(|demand| match demand.path() {
                DemandPath::Unrouted => false,
                DemandPath::Ecmp(paths) => paths.iter().any(|path| path.contains(key)),
                DemandPath::Tunnel(name) => self
                    .tunnels
                    .get(name)
                    .is_some_and(|t| t.path().transits(key)),
            })
            .collect()
    }

    /// Tunnels whose resolved path transits `key`
    pub fn tunnels_transiting(&self, key: &InterfaceKey) -> Vec<&Tunnel> {
        self.tunnels
            .values()
            .filter(|tunnel| tunnel.path().transits(key))
            .collect()
    }

    /// The distinct interfaces a demand's resolved path transits
    pub fn demand_interfaces(&self, key: &DemandKey) -> ModelResult<Vec<InterfaceKey>> {
        let demand = self
            .demands
            .get(key)
            .ok_or_else(|| ModelError::unknown("demand", key.to_string()))?;
        Ok(match demand.path() {
            DemandPath::Unrouted => Vec::new(),
            DemandPath::Ecmp(paths) => {
                let distinct: std::collections::BTreeSet<InterfaceKey> =
                    paths.iter().flatten().cloned().collect();
                distinct.into_iter().collect()
            }
            DemandPath::Tunnel(name) => self
                .tunnels
                .get(name)
                .and_then(|t| t.path().hops())
                .map(<[InterfaceKey]>::to_vec)
                .unwrap_or_default(),
        })
    }

    /// The ordered interfaces a tunnel's resolved path transits
    pub fn tunnel_interfaces(&self, name: &str) -> ModelResult<Vec<InterfaceKey>> {
        let tunnel = self
            .tunnels
            .get(name)
            .ok_or_else(|| ModelError::unknown("tunnel", name))?;
        Ok(tunnel
            .path()
            .hops()
            .map(<[InterfaceKey]>::to_vec)
            .unwrap_or_default())
    }

    // --- internals ---

    pub(crate) fn interface_mut(&mut self, key: &InterfaceKey) -> ModelResult<&mut Interface> {
        self.interfaces
            .get_mut(key)
            .ok_or_else(|| ModelError::unknown("interface", key.to_string()))
    }

    pub(crate) fn node_failed(&self, name: &NodeId) -> bool {
        self.nodes.get(name).is_some_and(Node::failed)
    }

    fn check_endpoints(&self, source: &NodeId, destination: &NodeId) -> ModelResult<()> {
        for node in [source, destination] {
            if !self.nodes.contains_key(node) {
                return Err(ModelError::unknown("node", node.as_str()));
            }
        }
        if source == destination {
            return Err(ModelError::InvalidConfiguration(format!(
                "source and destination must differ, got {source}"
            )));
        }
        Ok(())
    }

    fn next_free_address(&self) -> u32 {
        self.circuits.keys().next_back().map_or(1, |last| last + 1)
    }
}

fn validate_volume(volume: f64, what: &str) -> ModelResult<()> {
    if !(volume > 0.0) {
        return Err(ModelError::InvalidConfiguration(format!(
            "{what} must be greater than 0, got {volume}"
        )));
    }
    Ok(())
}

fn validate_bandwidth(bandwidth: f64) -> ModelResult<()> {
    if !(bandwidth >= 0.0) {
        return Err(ModelError::InvalidConfiguration(format!(
            "tunnel bandwidth must not be negative, got {bandwidth}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_model() -> Model {
        let mut model = Model::new();
        model.add_node("A").unwrap();
        model.add_node("B").unwrap();
        model
            .add_circuit(
                InterfaceSpec::new("A", "to-B", 10.0, 100.0),
                InterfaceSpec::new("B", "to-A", 10.0, 100.0),
                None,
            )
            .unwrap();
        model
    }

    #[test]
    fn test_add_circuit_builds_both_sides() {
        let model = two_node_model();
        let a = InterfaceKey::new("A", "to-B");
        let b = InterfaceKey::new("B", "to-A");
        assert_eq!(model.interfaces().count(), 2);
        assert_eq!(model.interface(&a).unwrap().remote_node(), &NodeId::new("B"));
        assert_eq!(model.interface(&b).unwrap().remote_node(), &NodeId::new("A"));
        assert_eq!(
            model.interface(&a).unwrap().address(),
            model.interface(&b).unwrap().address()
        );
    }

    #[test]
    fn test_remote_interface_resolves_pairing() {
        let model = two_node_model();
        let a = InterfaceKey::new("A", "to-B");
        let remote = model.remote_interface(&a).unwrap();
        assert_eq!(remote.key(), InterfaceKey::new("B", "to-A"));

        let circuit = model.circuit_of(&a).unwrap();
        assert_eq!(circuit.peer_of(&a), Some(&remote.key()));
    }

    #[test]
    fn test_duplicate_node_and_interface_are_rejected() {
        let mut model = two_node_model();
        assert!(matches!(
            model.add_node("A"),
            Err(ModelError::InvalidConfiguration(_))
        ));
        let duplicate = model.add_circuit(
            InterfaceSpec::new("A", "to-B", 10.0, 100.0),
            InterfaceSpec::new("B", "other", 10.0, 100.0),
            None,
        );
        assert!(matches!(
            duplicate,
            Err(ModelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_invalid_cost_and_capacity_rejected_before_write() {
        let mut model = two_node_model();
        let key = InterfaceKey::new("A", "to-B");
        assert!(model.set_interface_cost(&key, 0.5).is_err());
        assert_eq!(model.interface(&key).unwrap().cost(), 10.0);
        assert!(model.set_interface_capacity(&key, 0.0).is_err());
        assert_eq!(model.interface(&key).unwrap().capacity(), 100.0);

        let bad = model.add_circuit(
            InterfaceSpec::new("A", "bad", 0.0, 100.0),
            InterfaceSpec::new("B", "bad", 10.0, 100.0),
            None,
        );
        assert!(bad.is_err());
        // Nothing was written for the failed circuit
        assert_eq!(model.interfaces().count(), 2);
    }

    #[test]
    fn test_parallel_circuits_get_distinct_addresses() {
        let mut model = two_node_model();
        let second = model
            .add_circuit(
                InterfaceSpec::new("A", "to-B-2", 10.0, 100.0),
                InterfaceSpec::new("B", "to-A-2", 10.0, 100.0),
                None,
            )
            .unwrap();
        assert_eq!(model.circuits().count(), 2);
        assert_ne!(
            model.interface(&InterfaceKey::new("A", "to-B")).unwrap().address(),
            second
        );
    }

    #[test]
    fn test_endpoint_guards() {
        let mut model = two_node_model();
        assert!(matches!(
            model.add_demand("A", "Z", 10.0, "d"),
            Err(ModelError::UnknownEntity { .. })
        ));
        assert!(matches!(
            model.add_demand("A", "A", 10.0, "d"),
            Err(ModelError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            model.add_demand("A", "B", 0.0, "d"),
            Err(ModelError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            model.add_tunnel("t", "A", "B", -1.0),
            Err(ModelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_remove_node_is_guarded_by_references() {
        let mut model = two_node_model();
        let name = NodeId::new("A");
        assert!(matches!(
            model.remove_node(&name),
            Err(ModelError::InvalidOperation(_))
        ));
        let address = model.circuits().next().unwrap().address();
        model.remove_circuit(address).unwrap();
        model.remove_node(&name).unwrap();
        assert!(model.node(&name).is_none());
    }

    #[test]
    fn test_remove_circuit_guarded_by_srlg_membership() {
        let mut model = two_node_model();
        let key = InterfaceKey::new("A", "to-B");
        model.add_srlg("conduit-7").unwrap();
        model.srlg_add_interface("conduit-7", &key).unwrap();
        let address = model.circuits().next().unwrap().address();
        assert!(matches!(
            model.remove_circuit(address),
            Err(ModelError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_validate_passes_on_well_formed_model() {
        let model = two_node_model();
        model.validate().unwrap();
    }
}
