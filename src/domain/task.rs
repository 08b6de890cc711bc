use crate::api::task_dto::TaskDto;
use crate::domain::utils::id::{DeviceId, TaskId};
use crate::error::Error;

pub const BYTES_PER_KB: f64 = 1024.0;
pub const BITS_PER_BYTE: f64 = 8.0;

/// One immutable unit of work produced by the task generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub device_id: DeviceId,
    /// Creation (arrival) time in seconds since simulation start.
    pub creation_time_s: f64,
    pub size_kb: f64,
    /// Relative deadline in milliseconds from creation.
    pub deadline_ms: f64,
    pub priority: u8,
}

impl Task {
    pub fn size_bytes(&self) -> f64 {
        self.size_kb * BYTES_PER_KB
    }

    pub fn size_bits(&self) -> f64 {
        self.size_bytes() * BITS_PER_BYTE
    }
}

impl TryFrom<TaskDto> for Task {
    type Error = Error;

    fn try_from(dto: TaskDto) -> Result<Self, Self::Error> {
        if !(dto.creation_time_s.is_finite() && dto.creation_time_s >= 0.0) {
            return Err(Error::InvalidTask(format!("{}: creation time {} is not a non-negative number", dto.task_id, dto.creation_time_s)));
        }
        if !(dto.size_kb.is_finite() && dto.size_kb > 0.0) {
            return Err(Error::InvalidTask(format!("{}: size {} KB must be positive", dto.task_id, dto.size_kb)));
        }
        if dto.deadline_ms.is_nan() {
            return Err(Error::InvalidTask(format!("{}: deadline is NaN", dto.task_id)));
        }
        if !matches!(dto.priority, 1 | 2) {
            return Err(Error::InvalidTask(format!("{}: priority {} is not in {{1, 2}}", dto.task_id, dto.priority)));
        }

        Ok(Task {
            id: TaskId::new(dto.task_id),
            device_id: DeviceId::new(dto.device_id),
            creation_time_s: dto.creation_time_s,
            size_kb: dto.size_kb,
            deadline_ms: dto.deadline_ms,
            priority: dto.priority,
        })
    }
}
