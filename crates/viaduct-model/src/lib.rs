//! # Viaduct Model
//!
//! The capacity-planning model: a topology store, failure propagation,
//! bandwidth-reserving tunnel signaling, ECMP demand placement, and the
//! convergence loop that reconciles them to a stable state after any
//! change.
//!
//! ## Core Components
//!
//! - [`Model`]: keyed arenas for nodes, interfaces, circuits, demands,
//!   tunnels, and SRLGs; every mutation routes through it
//! - Failure propagation: interface, node, and shared-risk-group
//!   failure with cascading rules ([`Model::fail_interface`],
//!   [`Model::fail_node`], [`Model::fail_srlg`])
//! - [`Model::converge`]: signals tunnels in name order (earlier
//!   reservations block later tunnels), places demands over tunnels or
//!   the equal-cost subgraph, and repeats until tunnel paths stop
//!   moving
//!
//! ## Example
//!
//! ```
//! use viaduct_model::{InterfaceSpec, Model};
//!
//! let mut model = Model::new();
//! model.add_node("A")?;
//! model.add_node("B")?;
//! model.add_circuit(
//!     InterfaceSpec::new("A", "to-B", 10.0, 100.0),
//!     InterfaceSpec::new("B", "to-A", 10.0, 100.0),
//!     None,
//! )?;
//! model.add_demand("A", "B", 50.0, "web")?;
//! model.converge()?;
//!
//! let key = viaduct_model::InterfaceKey::new("A", "to-B");
//! let interface = model.interface(&key).unwrap();
//! assert_eq!(interface.utilization().ratio(), Some(0.5));
//! # Ok::<(), viaduct_model::ModelError>(())
//! ```
//!
//! The model is single-threaded and deterministic: identical inputs
//! replay to identical placements.

pub mod circuit;
pub mod convergence;
pub mod demand;
pub mod error;
pub mod interface;
pub mod model;
pub mod node;
pub mod srlg;
pub mod tunnel;

mod failure;

pub use circuit::Circuit;
pub use convergence::Convergence;
pub use demand::{Demand, DemandKey, DemandPath};
pub use error::{ModelError, ModelResult};
pub use interface::Interface;
pub use model::{ConvergenceConfig, InterfaceSpec, Model};
pub use node::Node;
pub use srlg::Srlg;
pub use tunnel::{Tunnel, TunnelPath};

// Re-export the shared vocabulary for convenience
pub use viaduct_core::{InterfaceKey, NodeId, Traffic, Utilization};
