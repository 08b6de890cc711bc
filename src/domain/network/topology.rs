use slotmap::SlotMap;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::api::topology_dto::TopologyDto;
use crate::domain::network::link::{BandwidthSchedule, Link, LinkId};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Represents a vertex of the network graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,

    /// Indicates whether this node hosts a remote-compute (fog) server and is
    /// therefore a candidate offload destination.
    pub is_server: bool,
}

/// Represents a specific route through the network.
///
/// `nodes` lists the traversed vertices from source to destination and `links` the
/// edges between them, so `links.len() == nodes.len() - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPath {
    pub nodes: Vec<NodeId>,
    pub links: Vec<LinkId>,
    /// Sum of the propagation delays along the path, the routing cost.
    pub propagation_delay_ms: f64,
}

/// Bandwidth and delay applied to edges that do not specify their own.
#[derive(Debug, Clone, Copy)]
pub struct LinkDefaults {
    pub bandwidth_bps: f64,
    pub delay_ms: f64,
}

/// Models the network graph.
///
/// The `NetworkTopology` manages:
/// * **Physical Layer**: Nodes and undirected links with bandwidth and propagation delay.
/// * **Connectivity**: An adjacency list kept in edge insertion order.
/// * **Routing Logic**: Delay-weighted shortest paths (Dijkstra).
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    /// All nodes in load order.
    nodes: Vec<Node>,

    /// Index lookup from node id to its position in `nodes`.
    node_index: HashMap<NodeId, usize>,

    /// All links, indexed by their key.
    links: SlotMap<LinkId, Link>,

    /// For every node (by index): `(neighbour index, link)` in edge insertion order.
    adjacency: Vec<Vec<(usize, LinkId)>>,
}

/// Heap entry of the Dijkstra frontier. `order` is the discovery sequence number and
/// breaks ties between equal costs in favour of the entry discovered first.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    order: u64,
    node: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost).then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl TryFrom<(TopologyDto, LinkDefaults)> for NetworkTopology {
    type Error = Error;

    fn try_from(args: (TopologyDto, LinkDefaults)) -> Result<Self> {
        let (dto, defaults) = args;

        // 1. Init nodes.
        let (nodes, node_index) = NetworkTopology::setup_nodes(&dto)?;

        // 2. Init links.
        let links = NetworkTopology::setup_links(&dto, &node_index, defaults)?;

        // 3. Build the adjacency list.
        let adjacency = NetworkTopology::setup_adjacency(&links, &node_index, nodes.len());

        log::info!("Topology loaded: {} nodes ({} servers), {} links.", nodes.len(), nodes.iter().filter(|n| n.is_server).count(), links.len());

        Ok(NetworkTopology { nodes, node_index, links, adjacency })
    }
}

impl NetworkTopology {
    /// Derives the node list, rejecting empty or duplicate node sets.
    pub fn setup_nodes(dto: &TopologyDto) -> Result<(Vec<Node>, HashMap<NodeId, usize>)> {
        if dto.nodes.is_empty() {
            return Err(Error::InvalidTopology("the node list is empty".to_string()));
        }

        let mut nodes = Vec::with_capacity(dto.nodes.len());
        let mut node_index = HashMap::with_capacity(dto.nodes.len());

        for node in &dto.nodes {
            let id = NodeId::new(node.id.clone());
            if node_index.insert(id.clone(), nodes.len()).is_some() {
                return Err(Error::InvalidTopology(format!("duplicate node id '{}'", node.id)));
            }
            nodes.push(Node { id, is_server: node.is_server });
        }

        Ok((nodes, node_index))
    }

    /// Initializes all links. An edge referring to an unknown node, a self loop or a
    /// non-positive bandwidth is a fatal topology error.
    pub fn setup_links(dto: &TopologyDto, node_index: &HashMap<NodeId, usize>, defaults: LinkDefaults) -> Result<SlotMap<LinkId, Link>> {
        let mut links: SlotMap<LinkId, Link> = SlotMap::with_key();

        for edge in &dto.edges {
            let source = NodeId::new(edge.source.clone());
            let target = NodeId::new(edge.target.clone());

            for endpoint in [&source, &target] {
                if !node_index.contains_key(endpoint) {
                    return Err(Error::InvalidTopology(format!("edge {} -- {} refers to unknown node '{}'", edge.source, edge.target, endpoint)));
                }
            }
            if source == target {
                return Err(Error::InvalidTopology(format!("self loop on node '{}'", edge.source)));
            }

            let bandwidth_bps = edge.bandwidth_bps.unwrap_or(defaults.bandwidth_bps);
            let delay_ms = edge.delay_ms.unwrap_or(defaults.delay_ms);

            if !(bandwidth_bps.is_finite() && bandwidth_bps > 0.0) {
                return Err(Error::InvalidTopology(format!("edge {} -- {} has non-positive bandwidth {}", edge.source, edge.target, bandwidth_bps)));
            }
            if !(delay_ms.is_finite() && delay_ms >= 0.0) {
                return Err(Error::InvalidTopology(format!("edge {} -- {} has negative delay {}", edge.source, edge.target, delay_ms)));
            }

            let name = format!("{}--{}", source, target);
            links.insert_with_key(|id| Link { id, name, source, target, delay_ms, schedule: BandwidthSchedule::new(bandwidth_bps) });
        }

        Ok(links)
    }

    /// Constructs the adjacency list. Both directions of an undirected edge share the
    /// same link.
    pub fn setup_adjacency(links: &SlotMap<LinkId, Link>, node_index: &HashMap<NodeId, usize>, node_count: usize) -> Vec<Vec<(usize, LinkId)>> {
        let mut adjacency = vec![Vec::new(); node_count];

        for (link_id, link) in links.iter() {
            let (Some(&source), Some(&target)) = (node_index.get(&link.source), node_index.get(&link.target)) else {
                log::error!("InvalidLinkConfiguration: link {} has an endpoint outside the node set.", link.name);
                continue;
            };
            adjacency[source].push((target, link_id));
            adjacency[target].push((source, link_id));
        }

        adjacency
    }

    /// Delay-weighted shortest path from `source` to `target` (Dijkstra).
    ///
    /// # Returns
    /// Returns `None` if either node is unknown or `target` is unreachable. A path from
    /// a node to itself has no links.
    pub fn find_path(&self, source: &NodeId, target: &NodeId) -> Option<NetworkPath> {
        let &start = self.node_index.get(source)?;
        let &goal = self.node_index.get(target)?;

        let node_count = self.nodes.len();
        let mut cost = vec![f64::INFINITY; node_count];
        let mut previous: Vec<Option<(usize, LinkId)>> = vec![None; node_count];
        let mut settled = vec![false; node_count];
        let mut frontier = BinaryHeap::new();
        let mut order: u64 = 0;

        cost[start] = 0.0;
        frontier.push(Frontier { cost: 0.0, order, node: start });

        while let Some(Frontier { cost: current_cost, node, .. }) = frontier.pop() {
            if settled[node] {
                continue;
            }
            settled[node] = true;

            if node == goal {
                break;
            }

            for &(neighbour, link_id) in &self.adjacency[node] {
                if settled[neighbour] {
                    continue;
                }
                let candidate = current_cost + self.links[link_id].delay_ms;

                // Strictly smaller only: the first discovery of an equal cost wins.
                if candidate < cost[neighbour] {
                    cost[neighbour] = candidate;
                    previous[neighbour] = Some((node, link_id));
                    order += 1;
                    frontier.push(Frontier { cost: candidate, order, node: neighbour });
                }
            }
        }

        if !settled[goal] {
            log::debug!("NoPathFound: {} => {}", source, target);
            return None;
        }

        let mut nodes = vec![self.nodes[goal].id.clone()];
        let mut links = Vec::new();
        let mut current = goal;
        while let Some((parent, link_id)) = previous[current] {
            links.push(link_id);
            nodes.push(self.nodes[parent].id.clone());
            current = parent;
        }
        nodes.reverse();
        links.reverse();

        Some(NetworkPath { nodes, links, propagation_delay_ms: cost[goal] })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_position(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn server_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.is_server).map(|n| n.id.clone()).collect()
    }

    /// Links incident to `node`, in adjacency order.
    pub fn adjacent_links(&self, node: &NodeId) -> impl Iterator<Item = LinkId> + '_ {
        let position = self.node_index.get(node).copied();
        position.into_iter().flat_map(move |p| self.adjacency[p].iter().map(|&(_, link_id)| link_id))
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
