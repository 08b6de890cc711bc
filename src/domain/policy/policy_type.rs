use crate::domain::config::{PolicyKind, SimulationConfig};
use crate::domain::policy::decision_policy_trait::DecisionPolicy;
use crate::domain::policy::learned_policy::LearnedPolicy;
use crate::domain::policy::score_policy::ScorePolicy;

impl PolicyKind {
    /// Creates the policy selected by the configuration.
    pub fn get_instance(&self, config: &SimulationConfig) -> Box<dyn DecisionPolicy> {
        match self {
            PolicyKind::Score => Box::new(ScorePolicy::new()),
            PolicyKind::Learned => Box::new(LearnedPolicy::new(&config.learned, config.seed)),
        }
    }
}
