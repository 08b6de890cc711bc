pub mod config;
pub mod controller;
pub mod learning;
pub mod network;
pub mod outcome;
pub mod policy;
pub mod resource;
pub mod simulator;
pub mod task;
pub mod utils;
