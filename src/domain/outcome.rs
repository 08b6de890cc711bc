use std::fmt;

use crate::domain::network::network_model::BlockingResource;
use crate::domain::task::Task;
use crate::domain::utils::id::{DeviceId, NodeId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Local,
    Offload,
    DropByCapacity,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Local => write!(f, "local"),
            Decision::Offload => write!(f, "offload"),
            Decision::DropByCapacity => write!(f, "drop_by_capacity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Hit,
    Miss,
    Drop,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Hit => write!(f, "hit"),
            Status::Miss => write!(f, "miss"),
            Status::Drop => write!(f, "drop"),
        }
    }
}

/// Timing of a task that actually executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionTiming {
    pub start_s: f64,
    pub end_s: f64,
    pub queue_delay_ms: f64,
    pub tx_delay_ms: f64,
    pub proc_delay_ms: f64,
    pub total_latency_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyBreakdown {
    pub compute_j: f64,
    pub transmit_j: f64,
}

impl EnergyBreakdown {
    pub fn total_j(&self) -> f64 {
        self.compute_j + self.transmit_j
    }
}

/// Where an executed or deadline-dropped task ran (or would have run).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub destination: Option<NodeId>,
    pub worker: Option<usize>,
}

/// Finalized result of one task.
///
/// Fields are private and records are only built through the constructors below, so
/// `status == Drop` holds exactly when the decision is `DropByCapacity` or the
/// deadline pre-check rejected the task before it consumed an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    task_id: TaskId,
    device_id: DeviceId,
    decision: Decision,
    status: Status,
    arrival_time_s: f64,
    queue_enter_time_s: f64,
    start_time_s: Option<f64>,
    end_time_s: Option<f64>,
    queue_delay_ms: f64,
    tx_delay_ms: f64,
    proc_delay_ms: f64,
    total_latency_ms: Option<f64>,
    energy: EnergyBreakdown,
    deadline_ms: f64,
    priority: u8,
    blocking_resource: Option<String>,
    placement: Placement,
}

impl OutcomeRecord {
    /// Task that ran to completion. Status is `Hit` if the total latency meets the deadline.
    pub fn completed(task: &Task, decision: Decision, now: f64, timing: ExecutionTiming, energy: EnergyBreakdown, placement: Placement) -> Self {
        debug_assert!(decision != Decision::DropByCapacity, "a capacity drop never executes");
        let status = if timing.total_latency_ms <= task.deadline_ms { Status::Hit } else { Status::Miss };

        Self {
            task_id: task.id.clone(),
            device_id: task.device_id.clone(),
            decision,
            status,
            arrival_time_s: task.creation_time_s,
            queue_enter_time_s: now,
            start_time_s: Some(timing.start_s),
            end_time_s: Some(timing.end_s),
            queue_delay_ms: timing.queue_delay_ms,
            tx_delay_ms: timing.tx_delay_ms,
            proc_delay_ms: timing.proc_delay_ms,
            total_latency_ms: Some(timing.total_latency_ms),
            energy,
            deadline_ms: task.deadline_ms,
            priority: task.priority,
            blocking_resource: None,
            placement,
        }
    }

    /// Task rejected by the deadline pre-check of its executor. Nothing was consumed
    /// on the executor, so no energy is charged.
    pub fn dropped_by_deadline(task: &Task, decision: Decision, now: f64, queue_delay_ms: f64, tx_delay_ms: f64, placement: Placement) -> Self {
        debug_assert!(decision != Decision::DropByCapacity, "use dropped_by_capacity");

        Self {
            task_id: task.id.clone(),
            device_id: task.device_id.clone(),
            decision,
            status: Status::Drop,
            arrival_time_s: task.creation_time_s,
            queue_enter_time_s: now,
            start_time_s: None,
            end_time_s: None,
            queue_delay_ms,
            tx_delay_ms,
            proc_delay_ms: 0.0,
            total_latency_ms: None,
            energy: EnergyBreakdown::default(),
            deadline_ms: task.deadline_ms,
            priority: task.priority,
            blocking_resource: None,
            placement,
        }
    }

    /// Offload rejected by admission control on `blocking`.
    pub fn dropped_by_capacity(task: &Task, now: f64, blocking: &BlockingResource, destination: Option<NodeId>) -> Self {
        Self {
            task_id: task.id.clone(),
            device_id: task.device_id.clone(),
            decision: Decision::DropByCapacity,
            status: Status::Drop,
            arrival_time_s: task.creation_time_s,
            queue_enter_time_s: now,
            start_time_s: None,
            end_time_s: None,
            queue_delay_ms: 0.0,
            tx_delay_ms: 0.0,
            proc_delay_ms: 0.0,
            total_latency_ms: None,
            energy: EnergyBreakdown::default(),
            deadline_ms: task.deadline_ms,
            priority: task.priority,
            blocking_resource: Some(blocking.to_string()),
            placement: Placement { destination, worker: None },
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_violation(&self) -> bool {
        self.status != Status::Hit
    }

    pub fn arrival_time_s(&self) -> f64 {
        self.arrival_time_s
    }

    pub fn queue_enter_time_s(&self) -> f64 {
        self.queue_enter_time_s
    }

    pub fn start_time_s(&self) -> Option<f64> {
        self.start_time_s
    }

    pub fn end_time_s(&self) -> Option<f64> {
        self.end_time_s
    }

    pub fn queue_delay_ms(&self) -> f64 {
        self.queue_delay_ms
    }

    pub fn tx_delay_ms(&self) -> f64 {
        self.tx_delay_ms
    }

    pub fn proc_delay_ms(&self) -> f64 {
        self.proc_delay_ms
    }

    pub fn total_latency_ms(&self) -> Option<f64> {
        self.total_latency_ms
    }

    pub fn energy(&self) -> EnergyBreakdown {
        self.energy
    }

    pub fn energy_j(&self) -> f64 {
        self.energy.total_j()
    }

    pub fn deadline_ms(&self) -> f64 {
        self.deadline_ms
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn blocking_resource(&self) -> Option<&str> {
        self.blocking_resource.as_deref()
    }

    pub fn destination(&self) -> Option<&NodeId> {
        self.placement.destination.as_ref()
    }

    pub fn worker(&self) -> Option<usize> {
        self.placement.worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(deadline_ms: f64) -> Task {
        Task {
            id: TaskId::new("t0"),
            device_id: DeviceId::new("dev_0"),
            creation_time_s: 0.0,
            size_kb: 1.0,
            deadline_ms,
            priority: 1,
        }
    }

    fn timing(total_latency_ms: f64) -> ExecutionTiming {
        ExecutionTiming { start_s: 0.0, end_s: total_latency_ms / 1000.0, queue_delay_ms: 0.0, tx_delay_ms: 0.0, proc_delay_ms: total_latency_ms, total_latency_ms }
    }

    #[test]
    fn latency_equal_to_deadline_is_a_hit() {
        let record = OutcomeRecord::completed(&task(5.0), Decision::Local, 0.0, timing(5.0), EnergyBreakdown::default(), Placement::default());
        assert_eq!(record.status(), Status::Hit);

        let record = OutcomeRecord::completed(&task(4.9), Decision::Local, 0.0, timing(5.0), EnergyBreakdown::default(), Placement::default());
        assert_eq!(record.status(), Status::Miss);
        assert!(record.is_violation());
    }

    #[test]
    fn drops_carry_no_latency_and_no_energy() {
        let record = OutcomeRecord::dropped_by_deadline(&task(50.0), Decision::Local, 0.0, 100.0, 0.0, Placement::default());
        assert_eq!(record.status(), Status::Drop);
        assert_eq!(record.total_latency_ms(), None);
        assert_eq!(record.start_time_s(), None);
        assert_eq!(record.energy_j(), 0.0);

        let blocking = BlockingResource::AccessLink(NodeId::new("n0"));
        let record = OutcomeRecord::dropped_by_capacity(&task(50.0), 0.0, &blocking, None);
        assert_eq!(record.decision(), Decision::DropByCapacity);
        assert_eq!(record.status(), Status::Drop);
        assert_eq!(record.blocking_resource(), Some("access:n0"));
    }
}
