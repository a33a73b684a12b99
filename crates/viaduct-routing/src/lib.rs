//! # Viaduct Routing
//!
//! Equal-cost shortest-path search for the Viaduct capacity-planning
//! model.
//!
//! ## Core Components
//!
//! - [`Link`]: one directed edge of the search graph, snapshotted from a
//!   live (non-failed) interface
//! - [`PathFinder`]: minimum-cost search plus bounded enumeration of the
//!   full equal-cost path set
//! - [`PathSet`]: the result — every minimum-cost path, in a
//!   reproducible tie-break order
//!
//! ## Algorithm
//!
//! 1. A label-setting pass (Dijkstra) finds the minimum total cost from
//!    source to destination over links that clear the
//!    reservable-bandwidth filter.
//! 2. A reverse pass computes each node's remaining distance to the
//!    destination.
//! 3. An ordered depth-first walk keeps only edges that lie on some
//!    minimum-cost path and enumerates the equal-cost set, capped to
//!    bound dense topologies. Links are explored in interface-key order,
//!    so repeated runs enumerate identical sets in identical order.
//!
//! An empty [`PathSet`] is a normal outcome, not an error: callers read
//! it as "unrouted".

pub mod finder;
pub mod graph;

pub use finder::{Hops, PathFinder, PathSet};
pub use graph::Link;
