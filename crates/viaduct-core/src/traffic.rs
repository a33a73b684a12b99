//! Tagged traffic and utilization values
//!
//! An interface either carries a numeric traffic load or it is down;
//! [`Traffic`] makes the two states explicit instead of overloading a
//! number with a sentinel, so utilization is a total, branch-explicit
//! function of traffic and capacity.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Traffic carried by an interface, or the explicit down marker
#[derive(Debug, Clone, Copy, PartialEq, Display, Serialize, Deserialize)]
pub enum Traffic {
    /// Interface is up and carrying this many units of traffic
    #[display("{_0}")]
    Load(f64),
    /// Interface is down and carries no number at all
    #[display("down")]
    Down,
}

impl Traffic {
    /// An up interface carrying nothing
    pub const ZERO: Self = Self::Load(0.0);

    /// The numeric load, when the interface is up
    pub fn load(&self) -> Option<f64> {
        match self {
            Self::Load(units) => Some(*units),
            Self::Down => None,
        }
    }

    /// Whether this is the down marker
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }

    /// Derive utilization against a capacity
    pub fn utilization(&self, capacity: f64) -> Utilization {
        match self {
            Self::Load(units) => Utilization::Ratio(units / capacity),
            Self::Down => Utilization::Down,
        }
    }
}

/// Derived interface utilization: traffic over capacity, or down
///
/// Always computed on read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Display, Serialize, Deserialize)]
pub enum Utilization {
    /// traffic / capacity; may exceed 1.0 when unreserved traffic
    /// overloads the interface
    #[display("{_0:.3}")]
    Ratio(f64),
    /// Interface is down
    #[display("down")]
    Down,
}

impl Utilization {
    /// The numeric ratio, when the interface is up
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Ratio(ratio) => Some(*ratio),
            Self::Down => None,
        }
    }

    /// Whether the interface is down
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down)
    }
}
