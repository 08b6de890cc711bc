use crate::domain::network::network_model::AdmissionDecision;
use crate::domain::policy::decision::{DecisionReason, OffloadRoute, PolicyDecision};
use crate::domain::simulator::state::SimulationState;
use crate::domain::task::Task;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum RoutePlan {
    Route(OffloadRoute),
    NoDestination,
    NoPath,
}

/// Picks the least-loaded server and the delay-shortest path to it from the device's
/// attachment node. Nothing is reserved.
pub fn plan_offload(state: &mut SimulationState, task: &Task, now: f64) -> Result<RoutePlan> {
    let access_node = state.attachment_of(&task.device_id)?;
    let candidates = state.network.server_nodes();

    let destination = match state.network.pick_destination(&candidates, now) {
        Ok(destination) => destination,
        Err(Error::NoEligibleDestination) => return Ok(RoutePlan::NoDestination),
        Err(e) => return Err(e),
    };

    let Some(path) = state.network.find_path(&access_node, &destination) else {
        return Ok(RoutePlan::NoPath);
    };

    let size_bits = task.size_bits();
    let transfer_time_s = state.network.transfer_time_s(&path.links, size_bits);

    Ok(RoutePlan::Route(OffloadRoute { access_node, destination, path, size_bits, transfer_time_s }))
}

/// Runs admission control over the access link and every path link. On success the
/// reservations are committed and the decision is `Offload`; otherwise it is
/// `DropByCapacity` with the first blocking resource and nothing committed.
pub fn admit_offload(state: &mut SimulationState, task: &Task, route: OffloadRoute, now: f64, reason: DecisionReason) -> PolicyDecision {
    let decision = state.network.admission_test(Some(&route.access_node), &route.path.links, route.size_bits, now, state.safety_factor);

    match decision {
        AdmissionDecision::Admitted => {
            let committed = state.network.commit_reservations(Some(&route.access_node), &route.path.links, route.size_bits, now, &task.id);
            log::debug!("Task {} admitted to {} with {} reservations.", task.id, route.destination, committed.len());
            PolicyDecision::offload(route, reason)
        }
        AdmissionDecision::Blocked(blocking) => {
            log::debug!("Task {} blocked on {} while offloading to {}.", task.id, blocking, route.destination);
            PolicyDecision::drop_by_capacity(blocking, route.destination)
        }
    }
}
