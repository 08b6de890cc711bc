use std::fmt::Debug;

use crate::domain::learning::deep_q_learner::LearnerDiagnostics;
use crate::domain::outcome::OutcomeRecord;
use crate::domain::policy::decision::PolicyDecision;
use crate::domain::simulator::state::SimulationState;
use crate::domain::task::Task;
use crate::error::Result;

/// Per-task offloading decision. Implementations share the admission contract: an
/// `Offload` decision has its reservations committed, a capacity failure becomes
/// `DropByCapacity` and leaves every link untouched.
pub trait DecisionPolicy: Debug {
    fn name(&self) -> &'static str;

    fn decide(&mut self, task: &Task, now: f64, state: &mut SimulationState) -> Result<PolicyDecision>;

    /// Called once per task after its outcome record is final.
    fn observe(&mut self, _task: &Task, _outcome: &OutcomeRecord, _now: f64, _state: &mut SimulationState) -> Result<()> {
        Ok(())
    }

    /// Whether the rule-based weight controller drives this policy's weights.
    fn uses_adaptive_weights(&self) -> bool;

    fn diagnostics(&self) -> Option<LearnerDiagnostics> {
        None
    }
}
