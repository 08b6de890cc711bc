pub mod admission;
pub mod decision;
pub mod decision_policy_trait;
pub mod features;
pub mod learned_policy;
pub mod policy_type;
pub mod score_policy;
