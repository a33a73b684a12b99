//! Interfaces and their capacity bookkeeping
//!
//! An interface is one directional end of a circuit. Its identity is
//! the (owning node, name) pair plus the structural fields fixed at
//! construction; traffic, reservations, and the failed flag mutate
//! during simulation and are deliberately excluded from equality and
//! hashing. All mutation goes through the model, which owns the arena
//! this type lives in.

use std::hash::{Hash, Hasher};

use serde::Serialize;
use viaduct_core::{InterfaceKey, NodeId, Traffic, Utilization};

use crate::error::{ModelError, ModelResult};

/// One directional end of a circuit
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    name: String,
    node: NodeId,
    remote_node: NodeId,
    address: u32,
    cost: f64,
    capacity: f64,
    traffic: Traffic,
    reserved_bandwidth: f64,
    failed: bool,
}

impl Interface {
    pub(crate) fn new(
        node: NodeId,
        name: String,
        remote_node: NodeId,
        address: u32,
        cost: f64,
        capacity: f64,
    ) -> ModelResult<Self> {
        validate_cost(cost)?;
        validate_capacity(capacity)?;
        Ok(Self {
            name,
            node,
            remote_node,
            address,
            cost,
            capacity,
            traffic: Traffic::ZERO,
            reserved_bandwidth: 0.0,
            failed: false,
        })
    }

    /// Identity key: (owning node, interface name)
    pub fn key(&self) -> InterfaceKey {
        InterfaceKey::new(self.node.clone(), self.name.clone())
    }

    /// The interface name, unique on its owning node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning node
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// The node at the other end of the circuit
    pub fn remote_node(&self) -> &NodeId {
        &self.remote_node
    }

    /// The circuit-pairing address
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Cost of traversing the interface, at least 1
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Capacity in traffic units, strictly positive
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Traffic currently placed on the interface, or the down marker
    pub fn traffic(&self) -> Traffic {
        self.traffic
    }

    /// Bandwidth reserved by tunnels transiting the interface
    pub fn reserved_bandwidth(&self) -> f64 {
        self.reserved_bandwidth
    }

    /// Headroom available for new tunnel reservations
    pub fn reservable_bandwidth(&self) -> f64 {
        self.capacity - self.reserved_bandwidth
    }

    /// Whether the interface is failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Derived utilization; computed on read, never stored
    pub fn utilization(&self) -> Utilization {
        self.traffic.utilization(self.capacity)
    }

    pub(crate) fn set_cost(&mut self, cost: f64) -> ModelResult<()> {
        validate_cost(cost)?;
        self.cost = cost;
        Ok(())
    }

    pub(crate) fn set_capacity(&mut self, capacity: f64) -> ModelResult<()> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        Ok(())
    }

    /// Failing drops any reservation and replaces traffic with the down
    /// marker; recovery starts from a clean zero load
    pub(crate) fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
        if failed {
            self.reserved_bandwidth = 0.0;
            self.traffic = Traffic::Down;
        } else {
            self.traffic = Traffic::ZERO;
        }
    }

    /// Start-of-pass reset: zero reservation, zero load when up
    pub(crate) fn reset_load(&mut self) {
        self.reserved_bandwidth = 0.0;
        self.traffic = if self.failed {
            Traffic::Down
        } else {
            Traffic::ZERO
        };
    }

    pub(crate) fn add_traffic(&mut self, share: f64) {
        debug_assert!(!self.failed, "traffic placed on failed interface");
        if let Traffic::Load(units) = self.traffic {
            self.traffic = Traffic::Load(units + share);
        }
    }

    pub(crate) fn reserve(&mut self, bandwidth: f64) {
        debug_assert!(
            self.reserved_bandwidth + bandwidth <= self.capacity + 1e-9,
            "reservation past capacity on {}",
            self.key()
        );
        self.reserved_bandwidth += bandwidth;
    }

    pub(crate) fn release(&mut self, bandwidth: f64) {
        self.reserved_bandwidth = (self.reserved_bandwidth - bandwidth).max(0.0);
    }
}

// Identity only: never the fields that mutate during simulation.
impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.node == other.node
            && self.remote_node == other.remote_node
            && self.address == other.address
    }
}

impl Eq for Interface {}

impl Hash for Interface {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.node.hash(state);
    }
}

pub(crate) fn validate_cost(cost: f64) -> ModelResult<()> {
    // `!(>=)` also rejects NaN
    if !(cost >= 1.0) {
        return Err(ModelError::InvalidConfiguration(format!(
            "interface cost must be at least 1, got {cost}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_capacity(capacity: f64) -> ModelResult<()> {
    if !(capacity > 0.0) {
        return Err(ModelError::InvalidConfiguration(format!(
            "interface capacity must be greater than 0, got {capacity}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn make_interface() -> Interface {
        Interface::new(
            NodeId::new("A"),
            "to-B".to_string(),
            NodeId::new("B"),
            1,
            10.0,
            100.0,
        )
        .unwrap()
    }

    fn hash_of(interface: &Interface) -> u64 {
        let mut hasher = DefaultHasher::new();
        interface.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_construction_validates_cost_and_capacity() {
        let bad_cost = Interface::new(
            NodeId::new("A"),
            "x".to_string(),
            NodeId::new("B"),
            1,
            0.5,
            100.0,
        );
        assert!(matches!(
            bad_cost,
            Err(ModelError::InvalidConfiguration(_))
        ));

        let bad_capacity = Interface::new(
            NodeId::new("A"),
            "x".to_string(),
            NodeId::new("B"),
            1,
            10.0,
            0.0,
        );
        assert!(matches!(
            bad_capacity,
            Err(ModelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_identity_survives_state_mutation() {
        let pristine = make_interface();
        let mut mutated = make_interface();

        mutated.add_traffic(42.0);
        mutated.reserve(30.0);
        assert_eq!(pristine, mutated);
        assert_eq!(hash_of(&pristine), hash_of(&mutated));

        mutated.set_failed(true);
        assert_eq!(pristine, mutated);
        assert_eq!(hash_of(&pristine), hash_of(&mutated));
    }

    #[test]
    fn test_failing_zeroes_reservation_and_downs_traffic() {
        let mut interface = make_interface();
        interface.reserve(60.0);
        interface.add_traffic(10.0);

        interface.set_failed(true);
        assert!(interface.failed());
        assert_eq!(interface.reserved_bandwidth(), 0.0);
        assert!(interface.traffic().is_down());
        assert!(interface.utilization().is_down());
    }

    #[test]
    fn test_reservable_bandwidth_is_headroom() {
        let mut interface = make_interface();
        assert_eq!(interface.reservable_bandwidth(), 100.0);
        interface.reserve(60.0);
        assert_eq!(interface.reservable_bandwidth(), 40.0);
        interface.release(60.0);
        assert_eq!(interface.reservable_bandwidth(), 100.0);
    }

    #[test]
    fn test_release_clamps_at_zero() {
        let mut interface = make_interface();
        interface.reserve(10.0);
        interface.release(25.0);
        assert_eq!(interface.reserved_bandwidth(), 0.0);
    }

    #[test]
    fn test_setters_reject_invalid_values_without_writing() {
        let mut interface = make_interface();
        assert!(interface.set_cost(0.0).is_err());
        assert_eq!(interface.cost(), 10.0);
        assert!(interface.set_capacity(-1.0).is_err());
        assert_eq!(interface.capacity(), 100.0);

        interface.set_cost(25.0).unwrap();
        assert_eq!(interface.cost(), 25.0);
    }

    #[test]
    fn test_utilization_ratio() {
        let mut interface = make_interface();
        interface.add_traffic(75.0);
        assert_eq!(interface.utilization(), Utilization::Ratio(0.75));
    }
}
