pub mod attachment;
pub mod link;
pub mod network_model;
pub mod topology;
