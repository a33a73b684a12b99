//! # Viaduct Core
//!
//! Shared vocabulary for the Viaduct capacity-planning model: identity
//! keys for nodes and interfaces, and the tagged traffic/utilization
//! values the other crates compute and report in.
//!
//! Entities live in keyed arenas owned by `viaduct-model`; everything
//! that crosses a crate boundary is referenced by the value keys defined
//! here, so equality and hashing never depend on mutable simulation
//! state.

pub mod identity;
pub mod traffic;

pub use identity::{InterfaceKey, NodeId};
pub use traffic::{Traffic, Utilization};
