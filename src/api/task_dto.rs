use serde::{Deserialize, Serialize};

/// One record of the task stream, in the field layout the task generator writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub task_id: String,
    pub device_id: String,
    pub creation_time_s: f64,
    pub size_kb: f64,
    pub deadline_ms: f64,
    pub priority: u8,
}
