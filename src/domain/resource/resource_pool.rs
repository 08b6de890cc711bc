use std::collections::BTreeMap;

use crate::domain::config::DeadlineCheck;
use crate::domain::simulator::time::{ms_to_s, s_to_ms, snap_time};
use crate::domain::utils::id::DeviceId;

/// Everything a single-server queue needs to decide on one job.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest {
    /// Earliest time the job can start (arrival at the executor), seconds.
    pub ready_at_s: f64,
    /// Creation time of the task the job belongs to, seconds.
    pub created_at_s: f64,
    pub processing_ms: f64,
    pub deadline_ms: f64,
    pub deadline_check: DeadlineCheck,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionSlot {
    pub start_s: f64,
    pub end_s: f64,
    /// Delay from task creation until execution start, milliseconds.
    pub queue_delay_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotGrant {
    Granted(ExecutionSlot),
    /// The deadline pre-check failed; the executor's clock was not touched.
    Rejected { queue_delay_ms: f64 },
}

/// Tentatively places a job behind `free_at_s` and applies the deadline pre-check.
/// Pure: the caller commits `end_s` as the new free-at time only on `Granted`.
pub fn plan_slot(free_at_s: f64, request: &SlotRequest) -> SlotGrant {
    let start_s = snap_time(request.ready_at_s.max(free_at_s));
    let queue_delay_ms = s_to_ms(start_s - request.created_at_s);

    let projected_ms = match request.deadline_check {
        DeadlineCheck::Queueing => queue_delay_ms,
        DeadlineCheck::QueueingPlusProcessing => queue_delay_ms + request.processing_ms,
    };
    if projected_ms > request.deadline_ms {
        return SlotGrant::Rejected { queue_delay_ms };
    }

    let end_s = snap_time(start_s + ms_to_s(request.processing_ms));
    SlotGrant::Granted(ExecutionSlot { start_s, end_s, queue_delay_ms })
}

/// One FIFO execution slot per device, tracked as a free-at timestamp.
#[derive(Debug, Clone, Default)]
pub struct DevicePool {
    free_at: BTreeMap<DeviceId, f64>,
}

impl DevicePool {
    pub fn new(devices: &[DeviceId]) -> Self {
        Self { free_at: devices.iter().map(|d| (d.clone(), 0.0)).collect() }
    }

    pub fn register(&mut self, device: &DeviceId) {
        self.free_at.entry(device.clone()).or_insert(0.0);
    }

    pub fn free_at(&self, device: &DeviceId) -> f64 {
        self.free_at.get(device).copied().unwrap_or(0.0)
    }

    pub fn set_free_at(&mut self, device: &DeviceId, time_s: f64) {
        self.free_at.insert(device.clone(), snap_time(time_s));
    }

    pub fn is_busy(&self, device: &DeviceId, now: f64) -> bool {
        self.free_at(device) > now
    }

    pub fn try_reserve(&mut self, device: &DeviceId, request: &SlotRequest) -> SlotGrant {
        let grant = plan_slot(self.free_at(device), request);
        if let SlotGrant::Granted(slot) = grant {
            self.free_at.insert(device.clone(), slot.end_s);
        }
        grant
    }
}

/// Fixed-size pool of identical remote workers.
#[derive(Debug, Clone)]
pub struct FogPool {
    free_at: Vec<f64>,
}

impl FogPool {
    pub fn new(workers: usize) -> Self {
        Self { free_at: vec![0.0; workers] }
    }

    pub fn worker_count(&self) -> usize {
        self.free_at.len()
    }

    pub fn free_at(&self, worker: usize) -> Option<f64> {
        self.free_at.get(worker).copied()
    }

    pub fn set_free_at(&mut self, worker: usize, time_s: f64) {
        if let Some(slot) = self.free_at.get_mut(worker) {
            *slot = snap_time(time_s);
        }
    }

    /// Worker that frees up first; ties go to the lowest index.
    pub fn earliest_worker(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &free_at) in self.free_at.iter().enumerate() {
            if best.is_none_or(|(_, best_free_at)| free_at < best_free_at) {
                best = Some((index, free_at));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Places the job on the earliest worker. Returns the worker index with the grant.
    pub fn try_reserve(&mut self, request: &SlotRequest) -> Option<(usize, SlotGrant)> {
        let worker = self.earliest_worker()?;
        let grant = plan_slot(self.free_at[worker], request);
        if let SlotGrant::Granted(slot) = grant {
            self.free_at[worker] = slot.end_s;
        }
        Some((worker, grant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ready_at_s: f64, processing_ms: f64, deadline_ms: f64) -> SlotRequest {
        SlotRequest { ready_at_s, created_at_s: ready_at_s, processing_ms, deadline_ms, deadline_check: DeadlineCheck::Queueing }
    }

    #[test]
    fn rejected_job_leaves_the_device_clock_alone() {
        let device = DeviceId::new("dev_0");
        let mut pool = DevicePool::new(std::slice::from_ref(&device));
        pool.set_free_at(&device, 0.1);

        let grant = pool.try_reserve(&device, &request(0.0, 5.0, 50.0));

        assert_eq!(grant, SlotGrant::Rejected { queue_delay_ms: 100.0 });
        assert_eq!(pool.free_at(&device), 0.1);
    }

    #[test]
    fn processing_time_counts_only_in_the_stricter_mode() {
        let mut req = request(0.0, 60.0, 50.0);
        assert!(matches!(plan_slot(0.0, &req), SlotGrant::Granted(_)));

        req.deadline_check = DeadlineCheck::QueueingPlusProcessing;
        assert!(matches!(plan_slot(0.0, &req), SlotGrant::Rejected { .. }));
    }

    #[test]
    fn earliest_worker_breaks_ties_by_index() {
        let mut pool = FogPool::new(3);
        pool.set_free_at(0, 0.5);
        pool.set_free_at(1, 0.2);
        pool.set_free_at(2, 0.2);
        assert_eq!(pool.earliest_worker(), Some(1));

        let (worker, grant) = pool.try_reserve(&request(0.0, 10.0, 1000.0)).unwrap();
        assert_eq!(worker, 1);
        let SlotGrant::Granted(slot) = grant else { panic!("expected a granted slot") };
        assert_eq!(slot.start_s, 0.2);
        assert_eq!(pool.free_at(1), Some(slot.end_s));
        assert_eq!(pool.free_at(2), Some(0.2));
    }

    #[test]
    fn rejected_job_leaves_the_worker_clock_alone() {
        let mut pool = FogPool::new(2);
        pool.set_free_at(0, 1.0);
        pool.set_free_at(1, 2.0);

        let (worker, grant) = pool.try_reserve(&request(0.0, 1.0, 10.0)).unwrap();

        assert_eq!(worker, 0);
        assert!(matches!(grant, SlotGrant::Rejected { .. }));
        assert_eq!(pool.free_at(0), Some(1.0));
    }
}
