use crate::domain::learning::transition::StateVector;
use crate::domain::network::link::LinkId;
use crate::domain::simulator::state::SimulationState;
use crate::domain::task::Task;
use crate::domain::utils::id::NodeId;

/// Scales of the learned policy's state vector.
#[derive(Debug, Clone, Copy)]
pub struct FeatureScales {
    pub mean_task_size_kb: f64,
    pub typical_deadline_ms: f64,
    pub lookahead_window_s: f64,
}

/// Network context the features are read from: the device's access node and the
/// candidate offload path, if one exists.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub access_node: Option<NodeId>,
    pub path_links: Vec<LinkId>,
}

/// Builds the state vector:
/// `[size, deadline, device busy, access utilization, path utilization, recent latency]`.
/// The recent-latency slot is reserved and always zero.
pub fn build_state(task: &Task, now: f64, state: &mut SimulationState, context: &RouteContext, scales: &FeatureScales) -> StateVector {
    let window_s = scales.lookahead_window_s;

    let size = task.size_kb / scales.mean_task_size_kb;
    let deadline = task.deadline_ms / scales.typical_deadline_ms;
    let busy = if state.devices.is_busy(&task.device_id, now) { 1.0 } else { 0.0 };
    let access = context.access_node.as_ref().map_or(0.0, |node| state.network.access_utilization(node, now, window_s));
    let path = state.network.path_utilization(&context.path_links, now, window_s);

    [size, deadline, busy, access, path, 0.0]
}
