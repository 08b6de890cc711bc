pub mod device_weights;
pub mod weight_controller;
