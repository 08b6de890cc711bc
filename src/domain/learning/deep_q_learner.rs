use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::config::LearnedPolicyConfig;
use crate::domain::learning::replay_buffer::ReplayBuffer;
use crate::domain::learning::transition::{ACTION_COUNT, Action, STATE_DIM, StateVector, Transition};
use crate::domain::learning::value_network::{AdamOptimizer, Gradients, ValueNetwork};

/// Counters exposed after a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LearnerDiagnostics {
    pub epsilon: f64,
    pub train_steps: u64,
    pub target_syncs: u64,
    pub stored_transitions: u64,
    pub last_loss: Option<f64>,
}

/// Selected action; `explored` is set when it came from the random branch, even if it matches the greedy one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionChoice {
    pub action: Action,
    pub explored: bool,
}

/// Epsilon-greedy deep Q-learner with experience replay and a hard-synced target network.
#[derive(Debug, Clone)]
pub struct DeepQLearner {
    online: ValueNetwork,
    target: ValueNetwork,
    optimizer: AdamOptimizer,
    replay: ReplayBuffer,
    rng: StdRng,

    batch_size: usize,
    min_replay: usize,
    discount: f64,
    target_sync_interval: u64,

    epsilon: f64,
    epsilon_end: f64,
    epsilon_decay: f64,

    train_steps: u64,
    target_syncs: u64,
    stored_transitions: u64,
    last_loss: Option<f64>,
}

impl DeepQLearner {
    pub fn new(config: &LearnedPolicyConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let online = ValueNetwork::new(STATE_DIM, config.hidden_units, ACTION_COUNT, &mut rng);
        let target = online.clone();
        let optimizer = AdamOptimizer::new(&online, config.optimizer_learning_rate);

        Self {
            online,
            target,
            optimizer,
            replay: ReplayBuffer::new(config.replay_capacity),
            rng,
            batch_size: config.batch_size,
            min_replay: config.min_replay,
            discount: config.discount,
            target_sync_interval: config.target_sync_interval.max(1),
            epsilon: config.epsilon_start,
            epsilon_end: config.epsilon_end,
            epsilon_decay: config.epsilon_decay,
            train_steps: 0,
            target_syncs: 0,
            stored_transitions: 0,
            last_loss: None,
        }
    }

    pub fn q_values(&self, state: &StateVector) -> [f64; ACTION_COUNT] {
        let values = self.online.predict(state);
        [values[0], values[1]]
    }

    /// Highest-valued action; `Local` wins ties.
    pub fn greedy_action(&self, state: &StateVector) -> Action {
        let [local, offload] = self.q_values(state);
        if offload > local { Action::Offload } else { Action::Local }
    }

    /// With probability epsilon a uniformly random action, otherwise the greedy one.
    pub fn select_action(&mut self, state: &StateVector) -> ActionChoice {
        if self.rng.random::<f64>() < self.epsilon {
            ActionChoice { action: Action::from_index(self.rng.random_range(0..ACTION_COUNT)), explored: true }
        } else {
            ActionChoice { action: self.greedy_action(state), explored: false }
        }
    }

    /// Stores the transition and decays epsilon toward its floor.
    pub fn store_transition(&mut self, transition: Transition) {
        self.replay.push(transition);
        self.stored_transitions += 1;
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_end);
    }

    pub fn ready_to_train(&self) -> bool {
        self.replay.len() >= self.min_replay.max(self.batch_size)
    }

    /// One mini-batch update of the online network. Returns the batch MSE, or `None`
    /// while the replay buffer is still warming up.
    pub fn train_step(&mut self) -> Option<f64> {
        if !self.ready_to_train() {
            return None;
        }

        let batch: Vec<Transition> = self.replay.sample(&mut self.rng, self.batch_size).into_iter().cloned().collect();
        let batch_len = batch.len() as f64;
        let mut grads = Gradients::zeros_like(&self.online);
        let mut loss = 0.0;

        for transition in &batch {
            let next_values = self.target.predict(&transition.next_state);
            let next_best = next_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let continuation = if transition.terminal { 0.0 } else { 1.0 };
            let td_target = transition.reward + self.discount * next_best * continuation;

            let trace = self.online.forward_trace(&transition.state);
            let action = transition.action.index();
            let error = trace.output()[action] - td_target;
            loss += error * error;

            let mut output_grad = [0.0; ACTION_COUNT];
            output_grad[action] = 2.0 * error;
            self.online.accumulate_gradients(&trace, &output_grad, &mut grads);
        }

        grads.scale(1.0 / batch_len);
        self.optimizer.step(&mut self.online, &grads);
        self.train_steps += 1;

        if self.train_steps % self.target_sync_interval == 0 {
            self.target.copy_from(&self.online);
            self.target_syncs += 1;
            log::debug!("Target network synchronised after {} training steps.", self.train_steps);
        }

        let loss = loss / batch_len;
        self.last_loss = Some(loss);
        Some(loss)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }

    pub fn online_network(&self) -> &ValueNetwork {
        &self.online
    }

    pub fn target_network(&self) -> &ValueNetwork {
        &self.target
    }

    pub fn diagnostics(&self) -> LearnerDiagnostics {
        LearnerDiagnostics {
            epsilon: self.epsilon,
            train_steps: self.train_steps,
            target_syncs: self.target_syncs,
            stored_transitions: self.stored_transitions,
            last_loss: self.last_loss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LearnedPolicyConfig {
        LearnedPolicyConfig {
            replay_capacity: 100,
            batch_size: 8,
            min_replay: 16,
            discount: 0.9,
            target_sync_interval: 3,
            epsilon_start: 1.0,
            epsilon_end: 0.5,
            epsilon_decay: 0.5,
            optimizer_learning_rate: 1e-3,
            hidden_units: 8,
            drop_penalty: 1.0,
            mean_task_size_kb: 50.0,
            typical_deadline_ms: 2.0,
            lookahead_window_s: 0.1,
        }
    }

    fn transition(i: usize) -> Transition {
        let state = [i as f64 / 10.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        Transition { state, action: Action::from_index(i % 2), reward: -1.0, next_state: state, terminal: false }
    }

    #[test]
    fn epsilon_decays_to_its_floor() {
        let mut learner = DeepQLearner::new(&config(), 1);
        learner.store_transition(transition(0));
        assert_eq!(learner.epsilon(), 0.5);
        learner.store_transition(transition(1));
        assert_eq!(learner.epsilon(), 0.5);
    }

    #[test]
    fn trains_only_after_warm_up_and_syncs_the_target() {
        let mut learner = DeepQLearner::new(&config(), 1);
        for i in 0..15 {
            learner.store_transition(transition(i));
            assert_eq!(learner.train_step(), None);
        }
        assert_eq!(learner.target_network(), learner.online_network());

        learner.store_transition(transition(15));
        assert!(learner.train_step().is_some());
        learner.train_step();
        assert_ne!(learner.target_network(), learner.online_network());

        learner.train_step();
        assert_eq!(learner.train_steps(), 3);
        assert_eq!(learner.target_network(), learner.online_network());
        assert_eq!(learner.diagnostics().target_syncs, 1);
    }

    #[test]
    fn random_picks_are_reported_as_explored() {
        let mut learner = DeepQLearner::new(&config(), 7);
        let state = [0.0; STATE_DIM];
        let choices: Vec<ActionChoice> = (0..32).map(|_| learner.select_action(&state)).collect();

        assert!(choices.iter().all(|choice| choice.explored), "epsilon 1 must always explore");
        assert!(
            choices.iter().any(|choice| choice.action == learner.greedy_action(&state)),
            "some random picks coincide with the greedy action and still count as explored"
        );
    }

    #[test]
    fn greedy_picks_are_not_explored() {
        let mut config = config();
        config.epsilon_start = 0.0;
        config.epsilon_end = 0.0;
        let mut learner = DeepQLearner::new(&config, 7);
        let state = [0.3, 1.0, 0.2, 0.0, 0.5, 0.0];

        for _ in 0..8 {
            let choice = learner.select_action(&state);
            assert!(!choice.explored);
            assert_eq!(choice.action, learner.greedy_action(&state));
        }
    }

    #[test]
    fn replay_fills_up_to_its_capacity() {
        let mut config = config();
        config.replay_capacity = 4;
        let mut learner = DeepQLearner::new(&config, 1);
        assert_eq!(learner.replay_len(), 0);

        for i in 0..6 {
            learner.store_transition(transition(i));
        }
        assert_eq!(learner.replay_len(), 4);
        assert_eq!(learner.diagnostics().stored_transitions, 6);
    }

    #[test]
    fn greedy_action_prefers_local_on_ties() {
        // Zero input with zero biases yields identical values for both actions.
        let learner = DeepQLearner::new(&config(), 1);
        let state = [0.0; STATE_DIM];
        assert_eq!(learner.q_values(&state), [0.0, 0.0]);
        assert_eq!(learner.greedy_action(&state), Action::Local);
    }
}
