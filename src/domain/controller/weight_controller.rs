use crate::domain::controller::device_weights::DeviceWeights;
use crate::domain::outcome::{Decision, OutcomeRecord};

/// Step applied to `w_local` of an offloaded record's device when offloading violates more often.
pub const PUSH_TOWARD_LOCAL: f64 = 0.05;
/// Step applied to `w_local` of a local record's device when local execution violates more often.
/// Smaller in magnitude than [`PUSH_TOWARD_LOCAL`].
pub const PUSH_TOWARD_OFFLOAD: f64 = -0.03;

/// Violation statistics of one decision class within a round.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassStatistics {
    pub records: usize,
    pub violations: usize,
}

impl ClassStatistics {
    /// Fraction of non-hit records; zero for an empty class.
    pub fn violation_rate(&self) -> f64 {
        if self.records == 0 { 0.0 } else { self.violations as f64 / self.records as f64 }
    }

    fn observe(&mut self, record: &OutcomeRecord) {
        self.records += 1;
        if record.is_violation() {
            self.violations += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundSummary {
    pub local: ClassStatistics,
    pub offload: ClassStatistics,
    pub capacity_drops: usize,
    pub adjusted_records: usize,
}

/// Rule-based adaptation of the per-device weights from one round of outcomes.
#[derive(Debug, Clone, Copy)]
pub struct WeightController {
    learning_rate: f64,
}

impl WeightController {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Violation rates per decision class. Capacity drops belong to neither class.
    pub fn summarize(round: &[OutcomeRecord]) -> RoundSummary {
        let mut summary = RoundSummary::default();
        for record in round {
            match record.decision() {
                Decision::Local => summary.local.observe(record),
                Decision::Offload => summary.offload.observe(record),
                Decision::DropByCapacity => summary.capacity_drops += 1,
            }
        }
        summary
    }

    /// Walks the round in order and nudges the device of every record whose class has the
    /// strictly higher violation rate. Devices can be nudged once per record they own.
    pub fn update_weights(&self, round: &[OutcomeRecord], weights: &mut DeviceWeights) -> RoundSummary {
        let mut summary = Self::summarize(round);
        let offload_rate = summary.offload.violation_rate();
        let local_rate = summary.local.violation_rate();

        for record in round {
            let step = match record.decision() {
                Decision::Offload if offload_rate > local_rate => PUSH_TOWARD_LOCAL,
                Decision::Local if local_rate > offload_rate => PUSH_TOWARD_OFFLOAD,
                _ => continue,
            };
            weights.get_or_insert(record.device_id()).nudge(self.learning_rate * step);
            summary.adjusted_records += 1;
        }

        log::debug!(
            "Weight update: offload violation rate {:.3} ({} records), local violation rate {:.3} ({} records), {} records adjusted.",
            offload_rate,
            summary.offload.records,
            local_rate,
            summary.local.records,
            summary.adjusted_records
        );

        summary
    }
}
