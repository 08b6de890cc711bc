pub mod processing;
pub mod resource_pool;
