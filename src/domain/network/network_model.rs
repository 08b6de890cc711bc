use std::fmt;

use crate::domain::network::link::{BandwidthSchedule, LinkId, LinkReservation};
use crate::domain::network::topology::{NetworkPath, NetworkTopology};
use crate::domain::utils::id::{NodeId, TaskId};
use crate::error::{Error, Result};

/// The resource that rejected a transfer during admission.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockingResource {
    AccessLink(NodeId),
    Link { id: LinkId, name: String },
}

impl fmt::Display for BlockingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockingResource::AccessLink(node) => write!(f, "access:{}", node),
            BlockingResource::Link { name, .. } => write!(f, "link:{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Admitted,
    Blocked(BlockingResource),
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }
}

/// End-of-run statistics of one link or access link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatistics {
    pub resource: String,
    pub kind: &'static str,
    pub bandwidth_bps: f64,
    pub active_reservations: usize,
    pub reserved_bits_total: f64,
    pub dropped_bits_total: f64,
    pub drop_count: u64,
}

impl LinkStatistics {
    fn from_schedule(resource: String, kind: &'static str, schedule: &BandwidthSchedule) -> Self {
        Self {
            resource,
            kind,
            bandwidth_bps: schedule.bandwidth_bps(),
            active_reservations: schedule.pending(),
            reserved_bits_total: schedule.reserved_bits_total(),
            dropped_bits_total: schedule.dropped_bits_total(),
            drop_count: schedule.drop_count(),
        }
    }
}

/// Topology plus the per-node access links, with admission control and reservation
/// bookkeeping on top.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    topology: NetworkTopology,

    /// Access-link schedules, one per node, parallel to `topology.nodes()`.
    access: Vec<BandwidthSchedule>,

    /// Lower bound of the admission check window in seconds.
    admission_window_floor_s: f64,
}

impl NetworkModel {
    pub fn new(topology: NetworkTopology, access_bandwidth_bps: f64, admission_window_floor_s: f64) -> Self {
        let access = (0..topology.node_count()).map(|_| BandwidthSchedule::new(access_bandwidth_bps)).collect();
        Self { topology, access, admission_window_floor_s }
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn find_path(&self, source: &NodeId, target: &NodeId) -> Option<NetworkPath> {
        self.topology.find_path(source, target)
    }

    pub fn server_nodes(&self) -> Vec<NodeId> {
        self.topology.server_nodes()
    }

    fn access_schedule_mut(&mut self, node: &NodeId) -> Option<&mut BandwidthSchedule> {
        let position = self.topology.node_position(node)?;
        self.access.get_mut(position)
    }

    pub fn access_schedule(&self, node: &NodeId) -> Option<&BandwidthSchedule> {
        let position = self.topology.node_position(node)?;
        self.access.get(position)
    }

    /// Pending reservations on the links adjacent to `node` plus its access-link queue.
    pub fn pending_load(&mut self, node: &NodeId, now: f64) -> usize {
        let adjacent: Vec<LinkId> = self.topology.adjacent_links(node).collect();
        let mut load = 0;

        for link_id in adjacent {
            if let Some(link) = self.topology.link_mut(link_id) {
                link.schedule.prune(now);
                load += link.schedule.pending();
            }
        }
        if let Some(schedule) = self.access_schedule_mut(node) {
            schedule.prune(now);
            load += schedule.pending();
        }

        load
    }

    /// Greedy least-loaded destination among `candidates`. Ties go to the earlier candidate.
    pub fn pick_destination(&mut self, candidates: &[NodeId], now: f64) -> Result<NodeId> {
        let mut best: Option<(&NodeId, usize)> = None;

        for candidate in candidates {
            let load = self.pending_load(candidate, now);
            if best.is_none_or(|(_, best_load)| load < best_load) {
                best = Some((candidate, load));
            }
        }

        best.map(|(node, _)| node.clone()).ok_or(Error::NoEligibleDestination)
    }

    /// Serial relay transfer time of `size_bits` over `path_links`, in seconds.
    pub fn transfer_time_s(&self, path_links: &[LinkId], size_bits: f64) -> f64 {
        path_links.iter().filter_map(|&id| self.topology.link(id)).map(|link| link.schedule.transfer_time_s(size_bits)).sum()
    }

    /// Checks the access link of `access_node` (if given) and then every path link in
    /// order. Stops at the first resource that cannot carry `size_bits` and records the
    /// rejection on it. Nothing is reserved.
    pub fn admission_test(&mut self, access_node: Option<&NodeId>, path_links: &[LinkId], size_bits: f64, now: f64, safety_factor: f64) -> AdmissionDecision {
        let window_floor_s = self.admission_window_floor_s;

        if let Some(node) = access_node {
            match self.access_schedule_mut(node) {
                Some(schedule) => {
                    if !schedule.admits(size_bits, now, window_floor_s, safety_factor) {
                        schedule.record_rejection(size_bits);
                        return AdmissionDecision::Blocked(BlockingResource::AccessLink(node.clone()));
                    }
                }
                None => log::warn!("Admission: access node {} is not part of the topology, skipping access check.", node),
            }
        }

        for &link_id in path_links {
            let Some(link) = self.topology.link_mut(link_id) else {
                log::warn!("Admission: unknown link {:?} on path, skipping.", link_id);
                continue;
            };
            if !link.schedule.admits(size_bits, now, window_floor_s, safety_factor) {
                link.schedule.record_rejection(size_bits);
                return AdmissionDecision::Blocked(BlockingResource::Link { id: link_id, name: link.name.clone() });
            }
        }

        AdmissionDecision::Admitted
    }

    /// Appends a reservation `[now, now + t)` with per-resource transfer time `t` on the
    /// access link and every path link. Callers must run [`Self::admission_test`] first;
    /// the commit is not transactional across links.
    pub fn commit_reservations(&mut self, access_node: Option<&NodeId>, path_links: &[LinkId], size_bits: f64, now: f64, task_id: &TaskId) -> Vec<LinkReservation> {
        let mut committed = Vec::with_capacity(path_links.len() + 1);

        if let Some(schedule) = access_node.and_then(|node| self.access_schedule_mut(node)) {
            committed.push(schedule.reserve(size_bits, now, task_id.clone()));
        }
        for &link_id in path_links {
            if let Some(link) = self.topology.link_mut(link_id) {
                committed.push(link.schedule.reserve(size_bits, now, task_id.clone()));
            }
        }

        committed
    }

    pub fn access_utilization(&mut self, node: &NodeId, now: f64, window_s: f64) -> f64 {
        self.access_schedule_mut(node).map_or(0.0, |schedule| schedule.utilization(now, window_s))
    }

    /// Mean utilization across `path_links`; zero for an empty path.
    pub fn path_utilization(&mut self, path_links: &[LinkId], now: f64, window_s: f64) -> f64 {
        let mut total = 0.0;
        let mut count = 0;
        for &link_id in path_links {
            if let Some(link) = self.topology.link_mut(link_id) {
                total += link.schedule.utilization(now, window_s);
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { total / count as f64 }
    }

    /// Reservations currently held by `task_id` on any link or access link.
    pub fn reservations_of(&self, task_id: &TaskId) -> usize {
        let on_links = self.topology.links().flat_map(|link| link.schedule.reservations()).filter(|r| &r.task_id == task_id).count();
        let on_access = self.access.iter().flat_map(|schedule| schedule.reservations()).filter(|r| &r.task_id == task_id).count();
        on_links + on_access
    }

    /// Statistics of all backbone links followed by all access links, pruned at `now`.
    pub fn link_statistics(&mut self, now: f64) -> Vec<LinkStatistics> {
        let mut statistics = Vec::with_capacity(self.topology.link_count() + self.access.len());

        for link in self.topology.links_mut() {
            link.schedule.prune(now);
            statistics.push(LinkStatistics::from_schedule(link.name.clone(), "link", &link.schedule));
        }
        for (node, schedule) in self.topology.nodes().iter().zip(self.access.iter_mut()) {
            schedule.prune(now);
            statistics.push(LinkStatistics::from_schedule(node.id.to_string(), "access", schedule));
        }

        statistics
    }
}
