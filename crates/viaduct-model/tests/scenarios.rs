//! End-to-end capacity-planning scenarios
//!
//! These drive the whole model the way a planning study would: build a
//! topology, configure demands and tunnels, converge, inject failures,
//! reconverge, and check where every unit of traffic and reservation
//! landed.

use viaduct_model::{
    DemandPath, InterfaceKey, InterfaceSpec, Model, ModelError, NodeId, TunnelPath, Utilization,
};

/// Two nodes joined by two parallel circuits, every interface cost 10,
/// capacity 100
fn parallel_link_model() -> Model {
    let mut model = Model::new();
    model.add_node("A").unwrap();
    model.add_node("B").unwrap();
    for suffix in ["1", "2"] {
        model
            .add_circuit(
                InterfaceSpec::new("A", format!("to-B-{suffix}"), 10.0, 100.0),
                InterfaceSpec::new("B", format!("to-A-{suffix}"), 10.0, 100.0),
                None,
            )
            .unwrap();
    }
    model
}

fn key(node: &str, name: &str) -> InterfaceKey {
    InterfaceKey::new(node, name)
}

#[test]
fn test_ecmp_demand_splits_across_parallel_links() {
    let mut model = parallel_link_model();
    let demand = model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.converge().unwrap();

    for suffix in ["1", "2"] {
        let interface = model.interface(&key("A", &format!("to-B-{suffix}"))).unwrap();
        assert_eq!(interface.traffic().load(), Some(75.0));
        assert_eq!(interface.utilization(), Utilization::Ratio(0.75));
    }
    // Directional placement: the reverse interfaces carry nothing
    assert_eq!(model.interface(&key("B", "to-A-1")).unwrap().traffic().load(), Some(0.0));

    match model.demand(&demand).unwrap().path() {
        DemandPath::Ecmp(paths) => assert_eq!(paths.len(), 2),
        other => panic!("expected ECMP split, got {other:?}"),
    }
    model.validate().unwrap();
}

#[test]
fn test_tunnels_fill_links_first_signaled_first_served() {
    let mut model = parallel_link_model();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();
    model.add_tunnel("t2", "A", "B", 70.0).unwrap();
    model.converge().unwrap();

    // t1 signals first and takes the lexicographically-first interface
    let first = model.interface(&key("A", "to-B-1")).unwrap();
    assert_eq!(first.reserved_bandwidth(), 60.0);
    assert_eq!(first.reservable_bandwidth(), 40.0);

    // t2 no longer fits there and lands on the other circuit
    let second = model.interface(&key("A", "to-B-2")).unwrap();
    assert_eq!(second.reserved_bandwidth(), 70.0);

    assert_eq!(
        model.tunnel_interfaces("t1").unwrap(),
        vec![key("A", "to-B-1")]
    );
    assert_eq!(
        model.tunnel_interfaces("t2").unwrap(),
        vec![key("A", "to-B-2")]
    );
    model.validate().unwrap();
}

#[test]
fn test_link_failure_resignals_tunnels_and_collapses_ecmp() {
    let mut model = parallel_link_model();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();
    model.add_tunnel("t2", "A", "B", 70.0).unwrap();
    model.converge().unwrap();

    model.fail_interface(&key("A", "to-B-1")).unwrap();
    model.converge().unwrap();

    // t1 re-signals onto the survivor; t2 no longer fits anywhere
    assert_eq!(
        model.tunnel_interfaces("t1").unwrap(),
        vec![key("A", "to-B-2")]
    );
    assert_eq!(model.tunnel("t2").unwrap().path(), &TunnelPath::Unrouted);
    let survivor = model.interface(&key("A", "to-B-2")).unwrap();
    assert_eq!(survivor.reserved_bandwidth(), 60.0);
    model.validate().unwrap();
}

#[test]
fn test_link_failure_collapses_ecmp_demand_onto_survivor() {
    let mut model = parallel_link_model();
    model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.converge().unwrap();

    model.fail_interface(&key("A", "to-B-1")).unwrap();
    model.converge().unwrap();

    let failed = model.interface(&key("A", "to-B-1")).unwrap();
    assert!(failed.traffic().is_down());
    assert!(failed.utilization().is_down());

    // The survivor now carries everything, past its capacity: that is a
    // reportable overload, not an error
    let survivor = model.interface(&key("A", "to-B-2")).unwrap();
    assert_eq!(survivor.traffic().load(), Some(150.0));
    assert_eq!(survivor.utilization(), Utilization::Ratio(1.5));
    model.validate().unwrap();
}

#[test]
fn test_fail_unfail_round_trip_restores_previous_placement() {
    let mut model = parallel_link_model();
    let demand = model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();
    model.converge().unwrap();

    let demand_before = model.demand(&demand).unwrap().path().clone();
    let tunnel_before = model.tunnel("t1").unwrap().path().clone();

    // Fail the link the tunnel is riding; it re-signals onto the other
    // circuit, then the deterministic tie-break brings it home again
    let target = key("A", "to-B-1");
    model.fail_interface(&target).unwrap();
    model.converge().unwrap();
    assert_ne!(model.tunnel("t1").unwrap().path(), &tunnel_before);

    model.unfail_interface(&target).unwrap();
    model.converge().unwrap();

    assert!(!model.interface(&target).unwrap().failed());
    assert_eq!(model.demand(&demand).unwrap().path(), &demand_before);
    assert_eq!(model.tunnel("t1").unwrap().path(), &tunnel_before);
}

#[test]
fn test_converge_is_idempotent() {
    let mut model = parallel_link_model();
    model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();

    // First run settles in two passes (tunnels start unrouted), a rerun
    // with no changes settles immediately
    let first = model.converge().unwrap();
    assert_eq!(first.passes, 2);

    let snapshot: Vec<(InterfaceKey, Option<f64>, f64)> = model
        .interfaces()
        .map(|i| (i.key(), i.traffic().load(), i.reserved_bandwidth()))
        .collect();
    let demand_paths: Vec<DemandPath> = model.demands().map(|d| d.path().clone()).collect();

    let second = model.converge().unwrap();
    assert_eq!(second.passes, 1);
    let after: Vec<(InterfaceKey, Option<f64>, f64)> = model
        .interfaces()
        .map(|i| (i.key(), i.traffic().load(), i.reserved_bandwidth()))
        .collect();
    assert_eq!(snapshot, after);
    assert_eq!(
        demand_paths,
        model.demands().map(|d| d.path().clone()).collect::<Vec<_>>()
    );
}

#[test]
fn test_demand_between_disconnected_nodes_is_unrouted() {
    let mut model = parallel_link_model();
    model.add_node("D").unwrap();
    let demand = model.add_demand("A", "D", 40.0, "stranded").unwrap();
    model.converge().unwrap();

    assert!(model.demand(&demand).unwrap().path().is_unrouted());
    assert!(model.demand_interfaces(&demand).unwrap().is_empty());
    for interface in model.interfaces() {
        assert_eq!(interface.traffic().load(), Some(0.0));
    }
}

#[test]
fn test_oversized_tunnel_is_unrouted_and_reserves_nothing() {
    let mut model = parallel_link_model();
    model.add_tunnel("huge", "A", "B", 150.0).unwrap();
    model.converge().unwrap();

    assert_eq!(model.tunnel("huge").unwrap().path(), &TunnelPath::Unrouted);
    for interface in model.interfaces() {
        assert_eq!(interface.reserved_bandwidth(), 0.0);
    }
}

#[test]
fn test_demand_rides_matching_tunnel() {
    let mut model = parallel_link_model();
    let demand = model.add_demand("A", "B", 50.0, "voice").unwrap();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();
    model.converge().unwrap();

    assert_eq!(
        model.demand(&demand).unwrap().path(),
        &DemandPath::Tunnel("t1".to_string())
    );
    // Full volume on the tunnel's path, nothing split onto the other link
    let carrying = model.interface(&key("A", "to-B-1")).unwrap();
    assert_eq!(carrying.traffic().load(), Some(50.0));
    assert_eq!(carrying.reserved_bandwidth(), 60.0);
    assert_eq!(
        model.interface(&key("A", "to-B-2")).unwrap().traffic().load(),
        Some(0.0)
    );
}

#[test]
fn test_demand_bound_to_unrouted_tunnel_stays_unrouted() {
    let mut model = parallel_link_model();
    let demand = model.add_demand("A", "B", 50.0, "voice").unwrap();
    model.add_tunnel("huge", "A", "B", 500.0).unwrap();
    model.converge().unwrap();

    // The matching tunnel exists but cannot be signaled; the demand does
    // not fall back to ECMP
    assert!(model.demand(&demand).unwrap().path().is_unrouted());
    for interface in model.interfaces() {
        assert_eq!(interface.traffic().load(), Some(0.0));
    }
}

#[test]
fn test_reverse_lookups() {
    let mut model = parallel_link_model();
    let riding = model.add_demand("A", "B", 50.0, "voice").unwrap();
    model.add_tunnel("t1", "A", "B", 60.0).unwrap();
    model.converge().unwrap();

    let carrying = key("A", "to-B-1");
    let demands = model.demands_transiting(&carrying);
    assert_eq!(demands.len(), 1);
    assert_eq!(demands[0].key(), &riding);

    let tunnels = model.tunnels_transiting(&carrying);
    assert_eq!(tunnels.len(), 1);
    assert_eq!(tunnels[0].name(), "t1");

    assert!(model.demands_transiting(&key("A", "to-B-2")).is_empty());
    assert_eq!(model.demand_interfaces(&riding).unwrap(), vec![carrying]);
}

#[test]
fn test_multi_hop_tunnel_reserves_every_hop() {
    let mut model = Model::new();
    for name in ["A", "B", "C"] {
        model.add_node(name).unwrap();
    }
    model
        .add_circuit(
            InterfaceSpec::new("A", "to-C", 10.0, 100.0),
            InterfaceSpec::new("C", "to-A", 10.0, 100.0),
            None,
        )
        .unwrap();
    model
        .add_circuit(
            InterfaceSpec::new("C", "to-B", 10.0, 100.0),
            InterfaceSpec::new("B", "to-C", 10.0, 100.0),
            None,
        )
        .unwrap();
    model.add_tunnel("t1", "A", "B", 25.0).unwrap();
    model.converge().unwrap();

    assert_eq!(
        model.tunnel_interfaces("t1").unwrap(),
        vec![key("A", "to-C"), key("C", "to-B")]
    );
    for hop in [key("A", "to-C"), key("C", "to-B")] {
        assert_eq!(model.interface(&hop).unwrap().reserved_bandwidth(), 25.0);
    }
    // Reservations are directional: the reverse interfaces hold nothing
    assert_eq!(model.interface(&key("C", "to-A")).unwrap().reserved_bandwidth(), 0.0);
    model.validate().unwrap();
}

#[test]
fn test_node_failure_reroutes_around_transit_node() {
    let mut model = Model::new();
    for name in ["A", "B", "C", "D"] {
        model.add_node(name).unwrap();
    }
    // Diamond: A reaches B through C or D, both at cost 20
    for (from, to) in [("A", "C"), ("C", "B"), ("A", "D"), ("D", "B")] {
        model
            .add_circuit(
                InterfaceSpec::new(from, format!("to-{to}"), 10.0, 100.0),
                InterfaceSpec::new(to, format!("to-{from}"), 10.0, 100.0),
                None,
            )
            .unwrap();
    }
    let demand = model.add_demand("A", "B", 80.0, "bulk").unwrap();
    model.converge().unwrap();
    match model.demand(&demand).unwrap().path() {
        DemandPath::Ecmp(paths) => assert_eq!(paths.len(), 2),
        other => panic!("expected ECMP split, got {other:?}"),
    }

    model.fail_node(&NodeId::new("C")).unwrap();
    model.converge().unwrap();
    assert_eq!(
        model.demand_interfaces(&demand).unwrap(),
        vec![key("A", "to-D"), key("D", "to-B")]
    );
    assert_eq!(
        model.interface(&key("A", "to-D")).unwrap().traffic().load(),
        Some(80.0)
    );
    model.validate().unwrap();
}

#[test]
fn test_unfail_under_failed_node_leaves_state_unchanged() {
    let mut model = parallel_link_model();
    model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.converge().unwrap();
    model.fail_node(&NodeId::new("B")).unwrap();

    let result = model.unfail_interface(&key("A", "to-B-1"));
    assert!(matches!(result, Err(ModelError::InvalidOperation(_))));
    assert!(model.interface(&key("A", "to-B-1")).unwrap().failed());
    assert!(model.node(&NodeId::new("B")).unwrap().failed());
    model.validate().unwrap();
}

#[test]
fn test_srlg_failure_drains_everything_it_touches() {
    let mut model = parallel_link_model();
    model.add_demand("A", "B", 150.0, "bulk").unwrap();
    model.add_srlg("shared-conduit").unwrap();
    model
        .srlg_add_interface("shared-conduit", &key("A", "to-B-1"))
        .unwrap();
    model
        .srlg_add_interface("shared-conduit", &key("A", "to-B-2"))
        .unwrap();
    model.converge().unwrap();

    model.fail_srlg("shared-conduit").unwrap();
    model.converge().unwrap();

    let demand_key = model.demands().next().unwrap().key().clone();
    assert!(model.demand(&demand_key).unwrap().path().is_unrouted());

    model.unfail_srlg("shared-conduit").unwrap();
    model.converge().unwrap();
    match model.demand(&demand_key).unwrap().path() {
        DemandPath::Ecmp(paths) => assert_eq!(paths.len(), 2),
        other => panic!("expected ECMP split after recovery, got {other:?}"),
    }
}
