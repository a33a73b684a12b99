//! Tunnel signaling, demand placement, and the convergence loop
//!
//! Every pass starts from a clean slate: all loading and reservations
//! are reset, tunnels are signaled in name order against the live
//! reservation state, then demands are placed over tunnels or the
//! equal-cost subgraph. The loop repeats until no tunnel's resolved
//! path moved between passes, bounded by the configured pass limit.
//!
//! Signaling order is load-bearing: bandwidth reserved by an earlier
//! tunnel in the pass is visible to, and can block, a later one. This
//! is first-signaled-first-served, not a global optimum.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use viaduct_core::InterfaceKey;
use viaduct_routing::{Link, PathFinder};

use crate::demand::{DemandKey, DemandPath};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::tunnel::TunnelPath;

/// Summary of a completed convergence run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Convergence {
    /// Passes taken to reach the fixed point
    pub passes: usize,
}

impl Model {
    /// Drive tunnel signaling and demand placement to a fixed point
    ///
    /// The only entry point that mutates traffic and reservation state;
    /// run it after any topology, demand, or tunnel change. Calling it
    /// twice with no intervening change yields identical results.
    ///
    /// When the pass bound is exhausted before tunnel paths stabilize,
    /// returns [`ModelError::ConvergenceNotReached`]; the last pass's
    /// state stays in the model, readable but provisional.
    pub fn converge(&mut self) -> ModelResult<Convergence> {
        let finder = PathFinder::new(self.config.max_ecmp_paths);
        let mut previous = self.tunnel_signatures();
        for pass in 1..=self.config.max_passes {
            self.reset_loading();
            self.signal_tunnels(&finder);
            self.place_demands(&finder);

            let current = self.tunnel_signatures();
            if current == previous {
                info!("Model converged after {} pass(es)", pass);
                return Ok(Convergence { passes: pass });
            }
            debug!("Pass {}: tunnel paths moved, running another pass", pass);
            previous = current;
        }
        warn!(
            "Convergence not reached after {} passes; state is provisional",
            self.config.max_passes
        );
        Err(ModelError::ConvergenceNotReached {
            passes: self.config.max_passes,
        })
    }

    /// Snapshot of every tunnel's resolved path, for the oscillation check
    fn tunnel_signatures(&self) -> BTreeMap<String, Option<Vec<InterfaceKey>>> {
        self.tunnels
            .iter()
            .map(|(name, tunnel)| {
                (
                    name.clone(),
                    tunnel.path().hops().map(<[InterfaceKey]>::to_vec),
                )
            })
            .collect()
    }

    /// Start-of-pass reset: zero loading everywhere, drop all reservations
    fn reset_loading(&mut self) {
        for interface in self.interfaces.values_mut() {
            interface.reset_load();
        }
        for tunnel in self.tunnels.values_mut() {
            tunnel.clear_reservation();
        }
    }

    /// Directed snapshot of the live (non-failed) subgraph with current
    /// reservation headroom
    fn live_links(&self) -> Vec<Link> {
        self.interfaces
            .values()
            .filter(|interface| !interface.failed())
            .map(|interface| Link {
                from: interface.node().clone(),
                to: interface.remote_node().clone(),
                interface: interface.key(),
                cost: interface.cost(),
                reservable: interface.reservable_bandwidth(),
            })
            .collect()
    }

    /// Signal every tunnel, in name order
    fn signal_tunnels(&mut self, finder: &PathFinder) {
        let names: Vec<String> = self.tunnels.keys().cloned().collect();
        for name in &names {
            self.release_tunnel(name);
            let Some((source, destination, bandwidth)) = self.tunnels.get(name).map(|t| {
                (t.source().clone(), t.destination().clone(), t.bandwidth())
            }) else {
                continue;
            };

            let links = self.live_links();
            let found = finder.equal_cost_paths(&links, &source, &destination, bandwidth);
            match found.first() {
                None => {
                    debug!(
                        "Tunnel {} unrouted: no path from {} to {} with {} reservable",
                        name, source, destination, bandwidth
                    );
                    if let Some(tunnel) = self.tunnels.get_mut(name) {
                        tunnel.set_path(TunnelPath::Unrouted);
                    }
                }
                Some(hops) => {
                    let hops = hops.clone();
                    for key in &hops {
                        if let Some(interface) = self.interfaces.get_mut(key) {
                            interface.reserve(bandwidth);
                        }
                    }
                    debug!(
                        "Tunnel {} signaled over {} hop(s) at cost {}, reserving {}",
                        name,
                        hops.len(),
                        found.cost,
                        bandwidth
                    );
                    if let Some(tunnel) = self.tunnels.get_mut(name) {
                        tunnel.set_path(TunnelPath::routed(hops));
                        tunnel.set_reserved(bandwidth);
                    }
                }
            }
        }
    }

    /// Release whatever bandwidth a tunnel currently holds; no-op when
    /// it holds none
    pub(crate) fn release_tunnel(&mut self, name: &str) {
        let Some(tunnel) = self.tunnels.get(name) else {
            return;
        };
        let amount = tunnel.reserved();
        if amount == 0.0 {
            return;
        }
        let hops: Vec<InterfaceKey> = tunnel
            .path()
            .hops()
            .map(<[InterfaceKey]>::to_vec)
            .unwrap_or_default();
        for key in &hops {
            if let Some(interface) = self.interfaces.get_mut(key) {
                interface.release(amount);
            }
        }
        if let Some(tunnel) = self.tunnels.get_mut(name) {
            tunnel.clear_reservation();
        }
        trace!("Tunnel {} released {} along its prior path", name, amount);
    }

    /// Place every demand, in identity order
    fn place_demands(&mut self, finder: &PathFinder) {
        // Traffic placement never changes the search graph, so one
        // snapshot serves the whole phase
        let links = self.live_links();
        let keys: Vec<DemandKey> = self.demands.keys().cloned().collect();
        for key in &keys {
            let Some(volume) = self.demands.get(key).map(|d| d.volume()) else {
                continue;
            };

            // A demand rides the first routed tunnel sharing its endpoints
            let mut matching = 0usize;
            let mut carrier: Option<(String, Vec<InterfaceKey>)> = None;
            for tunnel in self.tunnels.values() {
                if tunnel.source() == &key.source && tunnel.destination() == &key.destination {
                    matching += 1;
                    if carrier.is_none() {
                        if let TunnelPath::Routed { hops, .. } = tunnel.path() {
                            carrier = Some((tunnel.name().to_string(), hops.clone()));
                        }
                    }
                }
            }

            if matching > 0 {
                match carrier {
                    Some((name, hops)) => {
                        for hop in &hops {
                            self.add_traffic(hop, volume);
                        }
                        debug!(
                            "Demand {} riding tunnel {} over {} hop(s)",
                            key,
                            name,
                            hops.len()
                        );
                        self.set_demand_path(key, DemandPath::Tunnel(name));
                    }
                    None => {
                        debug!(
                            "Demand {} unrouted: all {} matching tunnel(s) unrouted",
                            key, matching
                        );
                        self.set_demand_path(key, DemandPath::Unrouted);
                    }
                }
                continue;
            }

            let found = finder.equal_cost_paths(&links, &key.source, &key.destination, 0.0);
            if found.is_empty() {
                debug!(
                    "Demand {} unrouted: no path from {} to {}",
                    key, key.source, key.destination
                );
                self.set_demand_path(key, DemandPath::Unrouted);
                continue;
            }

            let share = volume / found.paths.len() as f64;
            for path in &found.paths {
                for hop in path {
                    self.add_traffic(hop, share);
                }
            }
            debug!(
                "Demand {} split over {} equal-cost path(s), {} unit(s) each",
                key,
                found.paths.len(),
                share
            );
            self.set_demand_path(key, DemandPath::Ecmp(found.paths));
        }
    }

    fn add_traffic(&mut self, key: &InterfaceKey, share: f64) {
        if let Some(interface) = self.interfaces.get_mut(key) {
            interface.add_traffic(share);
            trace!("Placed {} unit(s) on {}", share, key);
        }
    }

    fn set_demand_path(&mut self, key: &DemandKey, path: DemandPath) {
        if let Some(demand) = self.demands.get_mut(key) {
            demand.set_path(path);
        }
    }
}
