mod common;

use common::{edge, node};
use offload_sim::api::topology_dto::TopologyDto;
use offload_sim::domain::network::network_model::NetworkModel;
use offload_sim::domain::network::topology::{LinkDefaults, NetworkTopology};
use offload_sim::domain::utils::id::NodeId;
use offload_sim::error::Error;

const DEFAULTS: LinkDefaults = LinkDefaults { bandwidth_bps: 1e6, delay_ms: 5.0 };

fn diamond(lower_delay_ms: f64) -> TopologyDto {
    TopologyDto {
        nodes: vec![node("a", false), node("b", false), node("c", false), node("d", true)],
        edges: vec![edge("a", "b", 1e9, 1.0), edge("b", "d", 1e9, 1.0), edge("a", "c", 1e9, 1.0), edge("c", "d", 1e9, lower_delay_ms)],
    }
}

fn ids(path: &[NodeId]) -> Vec<&str> {
    path.iter().map(NodeId::as_str).collect()
}

#[test]
fn test_shortest_path_minimizes_total_delay() {
    let topology = NetworkTopology::try_from((diamond(5.0), DEFAULTS)).unwrap();

    let path = topology.find_path(&NodeId::new("a"), &NodeId::new("d")).expect("d is reachable");

    assert_eq!(ids(&path.nodes), vec!["a", "b", "d"]);
    assert_eq!(path.links.len(), 2);
    assert_eq!(path.propagation_delay_ms, 2.0);
}

#[test]
fn test_equal_cost_paths_resolve_to_first_discovered() {
    let topology = NetworkTopology::try_from((diamond(1.0), DEFAULTS)).unwrap();

    for _ in 0..10 {
        let path = topology.find_path(&NodeId::new("a"), &NodeId::new("d")).unwrap();
        assert_eq!(ids(&path.nodes), vec!["a", "b", "d"], "Tie must always go to the branch discovered first.");
    }
}

#[test]
fn test_lower_cost_detour_beats_fewer_hops() {
    let dto = TopologyDto {
        nodes: vec![node("a", false), node("b", false), node("c", true)],
        edges: vec![edge("a", "c", 1e9, 10.0), edge("a", "b", 1e9, 1.0), edge("b", "c", 1e9, 1.0)],
    };
    let topology = NetworkTopology::try_from((dto, DEFAULTS)).unwrap();

    let path = topology.find_path(&NodeId::new("a"), &NodeId::new("c")).unwrap();

    assert_eq!(ids(&path.nodes), vec!["a", "b", "c"]);
}

#[test]
fn test_unreachable_and_unknown_nodes_have_no_path() {
    let dto = TopologyDto { nodes: vec![node("a", false), node("b", false), node("island", true)], edges: vec![edge("a", "b", 1e9, 1.0)] };
    let topology = NetworkTopology::try_from((dto, DEFAULTS)).unwrap();

    assert!(topology.find_path(&NodeId::new("a"), &NodeId::new("island")).is_none());
    assert!(topology.find_path(&NodeId::new("a"), &NodeId::new("nowhere")).is_none());

    let to_self = topology.find_path(&NodeId::new("a"), &NodeId::new("a")).unwrap();
    assert!(to_self.links.is_empty());
    assert_eq!(ids(&to_self.nodes), vec!["a"]);
}

#[test]
fn test_missing_edge_attributes_use_link_defaults() {
    let dto = TopologyDto {
        nodes: vec![node("a", false), node("b", true)],
        edges: vec![offload_sim::api::topology_dto::EdgeDto { source: "a".to_string(), target: "b".to_string(), bandwidth_bps: None, delay_ms: None }],
    };
    let topology = NetworkTopology::try_from((dto, DEFAULTS)).unwrap();

    let link = topology.links().next().unwrap();
    assert_eq!(link.name, "a--b");
    assert_eq!(link.delay_ms, 5.0);
    assert_eq!(link.schedule.bandwidth_bps(), 1e6);
}

#[test]
fn test_malformed_topologies_are_rejected() {
    let empty = TopologyDto { nodes: vec![], edges: vec![] };
    assert!(matches!(NetworkTopology::try_from((empty, DEFAULTS)), Err(Error::InvalidTopology(_))));

    let duplicate = TopologyDto { nodes: vec![node("a", false), node("a", true)], edges: vec![] };
    assert!(matches!(NetworkTopology::try_from((duplicate, DEFAULTS)), Err(Error::InvalidTopology(_))));

    let dangling = TopologyDto { nodes: vec![node("a", false)], edges: vec![edge("a", "ghost", 1e9, 1.0)] };
    assert!(matches!(NetworkTopology::try_from((dangling, DEFAULTS)), Err(Error::InvalidTopology(_))));

    let self_loop = TopologyDto { nodes: vec![node("a", false)], edges: vec![edge("a", "a", 1e9, 1.0)] };
    assert!(matches!(NetworkTopology::try_from((self_loop, DEFAULTS)), Err(Error::InvalidTopology(_))));

    let zero_bandwidth = TopologyDto { nodes: vec![node("a", false), node("b", true)], edges: vec![edge("a", "b", 0.0, 1.0)] };
    assert!(matches!(NetworkTopology::try_from((zero_bandwidth, DEFAULTS)), Err(Error::InvalidTopology(_))));
}

#[test]
fn test_transfer_time_is_serial_over_the_path() {
    let dto = TopologyDto {
        nodes: vec![node("a", false), node("b", false), node("c", true)],
        edges: vec![edge("a", "b", 1e6, 1.0), edge("b", "c", 2e6, 1.0)],
    };
    let model = NetworkModel::new(NetworkTopology::try_from((dto, DEFAULTS)).unwrap(), 1e7, 1.0);
    let path = model.find_path(&NodeId::new("a"), &NodeId::new("c")).unwrap();

    // 1e6 bits: one second on the first hop, half a second on the second.
    assert_eq!(model.transfer_time_s(&path.links, 1e6), 1.5);
    assert_eq!(model.server_nodes(), vec![NodeId::new("c")]);
}
