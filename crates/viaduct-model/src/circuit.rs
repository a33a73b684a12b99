//! Circuits: paired opposite-direction interfaces

use serde::Serialize;
use viaduct_core::InterfaceKey;

/// A bidirectional link, realized as two interfaces sharing one address
///
/// The two sides' failed states are mechanically linked through the
/// model's failure operations.
#[derive(Debug, Clone, Serialize)]
pub struct Circuit {
    address: u32,
    a: InterfaceKey,
    b: InterfaceKey,
}

impl Circuit {
    pub(crate) fn new(address: u32, a: InterfaceKey, b: InterfaceKey) -> Self {
        // Normalize so (a, b) and (b, a) build the same circuit
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { address, a, b }
    }

    /// The circuit-pairing address, unique per circuit
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Both sides of the circuit
    pub fn sides(&self) -> (&InterfaceKey, &InterfaceKey) {
        (&self.a, &self.b)
    }

    /// The opposite side, if `key` is one of this circuit's sides
    pub fn peer_of(&self, key: &InterfaceKey) -> Option<&InterfaceKey> {
        if key == &self.a {
            Some(&self.b)
        } else if key == &self.b {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Whether `key` is one of this circuit's sides
    pub fn touches(&self, key: &InterfaceKey) -> bool {
        key == &self.a || key == &self.b
    }
}
