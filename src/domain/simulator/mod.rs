pub mod event_queue;
pub mod simulator;
pub mod state;
pub mod time;
