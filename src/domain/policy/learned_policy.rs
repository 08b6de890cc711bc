use crate::domain::config::LearnedPolicyConfig;
use crate::domain::learning::deep_q_learner::{ActionChoice, DeepQLearner, LearnerDiagnostics};
use crate::domain::learning::transition::{Action, StateVector, Transition};
use crate::domain::outcome::{OutcomeRecord, Status};
use crate::domain::policy::admission::{RoutePlan, admit_offload, plan_offload};
use crate::domain::policy::decision::{DecisionReason, PolicyDecision};
use crate::domain::policy::decision_policy_trait::DecisionPolicy;
use crate::domain::policy::features::{FeatureScales, RouteContext, build_state};
use crate::domain::simulator::state::SimulationState;
use crate::domain::task::Task;
use crate::error::Result;

/// Deadlines are floored to this many milliseconds when normalizing the reward.
const MIN_REWARD_DEADLINE_MS: f64 = 1e-3;

/// Decision awaiting its outcome.
#[derive(Debug, Clone)]
struct PendingExperience {
    state: StateVector,
    action: Action,
    context: RouteContext,
}

/// Epsilon-greedy policy over a deep Q-learner. Per-device weights are not consulted.
#[derive(Debug)]
pub struct LearnedPolicy {
    learner: DeepQLearner,
    scales: FeatureScales,
    drop_penalty: f64,
    pending: Option<PendingExperience>,
}

impl LearnedPolicy {
    pub fn new(config: &LearnedPolicyConfig, seed: u64) -> Self {
        Self {
            learner: DeepQLearner::new(config, seed),
            scales: FeatureScales {
                mean_task_size_kb: config.mean_task_size_kb,
                typical_deadline_ms: config.typical_deadline_ms,
                lookahead_window_s: config.lookahead_window_s,
            },
            drop_penalty: config.drop_penalty,
            pending: None,
        }
    }

    pub fn learner(&self) -> &DeepQLearner {
        &self.learner
    }

    /// `-(latency / deadline)`, minus the drop penalty for dropped tasks. Dropped tasks
    /// have no total latency and are charged the queueing delay they had accumulated.
    pub fn reward(&self, outcome: &OutcomeRecord) -> f64 {
        let latency_ms = outcome.total_latency_ms().unwrap_or(outcome.queue_delay_ms());
        let mut reward = -(latency_ms / outcome.deadline_ms().max(MIN_REWARD_DEADLINE_MS));
        if outcome.status() == Status::Drop {
            reward -= self.drop_penalty;
        }
        reward
    }
}

impl DecisionPolicy for LearnedPolicy {
    fn name(&self) -> &'static str {
        "learned"
    }

    fn decide(&mut self, task: &Task, now: f64, state: &mut SimulationState) -> Result<PolicyDecision> {
        let plan = plan_offload(state, task, now)?;

        let context = match &plan {
            RoutePlan::Route(route) => RouteContext { access_node: Some(route.access_node.clone()), path_links: route.path.links.clone() },
            RoutePlan::NoDestination | RoutePlan::NoPath => RouteContext { access_node: Some(state.attachment_of(&task.device_id)?), path_links: Vec::new() },
        };
        let features = build_state(task, now, state, &context, &self.scales);

        let ActionChoice { action, explored } = self.learner.select_action(&features);
        let reason = if explored { DecisionReason::Explore } else { DecisionReason::Exploit };
        self.pending = Some(PendingExperience { state: features, action, context });

        let decision = match (action, plan) {
            (Action::Local, _) => PolicyDecision::local(reason),
            (Action::Offload, RoutePlan::Route(route)) => admit_offload(state, task, route, now, reason),
            (Action::Offload, RoutePlan::NoDestination) => PolicyDecision::local(DecisionReason::NoDestination),
            (Action::Offload, RoutePlan::NoPath) => PolicyDecision::local(DecisionReason::NoPath),
        };

        Ok(decision)
    }

    fn observe(&mut self, task: &Task, outcome: &OutcomeRecord, now: f64, state: &mut SimulationState) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            log::warn!("Outcome of task {} arrived without a pending decision.", task.id);
            return Ok(());
        };

        let reward = self.reward(outcome);
        let next_state = build_state(task, now, state, &pending.context, &self.scales);

        self.learner.store_transition(Transition { state: pending.state, action: pending.action, reward, next_state, terminal: false });

        if let Some(loss) = self.learner.train_step() {
            log::trace!("Training step {} finished with loss {:.6}.", self.learner.train_steps(), loss);
        }

        Ok(())
    }

    fn uses_adaptive_weights(&self) -> bool {
        false
    }

    fn diagnostics(&self) -> Option<LearnerDiagnostics> {
        Some(self.learner.diagnostics())
    }
}
