pub mod deep_q_learner;
pub mod replay_buffer;
pub mod transition;
pub mod value_network;
