use crate::domain::policy::admission::{RoutePlan, admit_offload, plan_offload};
use crate::domain::policy::decision::{DecisionReason, PolicyDecision};
use crate::domain::policy::decision_policy_trait::DecisionPolicy;
use crate::domain::simulator::state::SimulationState;
use crate::domain::simulator::time::s_to_ms;
use crate::domain::task::Task;
use crate::error::Result;

/// Normalized estimate divided by the deadline; a non-positive deadline makes every option infinitely expensive.
fn normalize(time_ms: f64, deadline_ms: f64) -> f64 {
    if deadline_ms > 0.0 { time_ms / deadline_ms } else { f64::INFINITY }
}

/// `0 * inf` would be NaN and lose every comparison; a zero weight means the option costs nothing.
fn weighted(weight: f64, norm: f64) -> f64 {
    if weight == 0.0 { 0.0 } else { weight * norm }
}

/// Compares deadline-normalized local and offload time estimates, each scaled by the
/// device's current weight. The lower score wins; local wins ties.
#[derive(Debug, Default)]
pub struct ScorePolicy;

impl ScorePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl DecisionPolicy for ScorePolicy {
    fn name(&self) -> &'static str {
        "score"
    }

    fn decide(&mut self, task: &Task, now: f64, state: &mut SimulationState) -> Result<PolicyDecision> {
        let weight = state.weights.get(&task.device_id);
        let (local_ms, _) = state.compute.local_processing_ms(task.size_kb);
        let local_norm = normalize(local_ms, task.deadline_ms);

        let route = match plan_offload(state, task, now)? {
            RoutePlan::Route(route) => route,
            RoutePlan::NoDestination => return Ok(PolicyDecision::local(DecisionReason::NoDestination)),
            RoutePlan::NoPath => return Ok(PolicyDecision::local(DecisionReason::NoPath)),
        };

        let (remote_ms, _) = state.compute.remote_processing_ms(task.size_kb);
        let offload_norm = normalize(s_to_ms(route.transfer_time_s) + remote_ms, task.deadline_ms);

        let score_local = weighted(weight.w_local(), local_norm);
        let score_offload = weighted(weight.w_offload(), offload_norm);

        if score_local <= score_offload {
            return Ok(PolicyDecision::local(DecisionReason::LowerLocalScore));
        }

        Ok(admit_offload(state, task, route, now, DecisionReason::LowerOffloadScore))
    }

    fn uses_adaptive_weights(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weight_never_produces_nan() {
        assert_eq!(weighted(0.0, f64::INFINITY), 0.0);
        assert_eq!(weighted(0.5, 2.0), 1.0);
        assert_eq!(normalize(5.0, 0.0), f64::INFINITY);
    }
}
