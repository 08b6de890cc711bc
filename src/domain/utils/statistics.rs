use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::domain::controller::device_weights::WeightSnapshot;
use crate::domain::learning::deep_q_learner::LearnerDiagnostics;
use crate::domain::network::network_model::LinkStatistics;
use crate::domain::outcome::{Decision, OutcomeRecord, Status};
use crate::error::Result;

/// Target of the structured analytics events (round closes, run summary).
pub const ANALYTICS_TARGET: &str = "analytics";

const DELIMITER: u8 = b';';

/// End-of-run metrics over all outcome records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryMetrics {
    pub num_tasks: usize,
    pub hits: usize,
    pub misses: usize,
    pub drops: usize,
    pub capacity_drops: usize,
    pub offloaded: usize,
    /// Mean total latency over executed tasks; drops have no latency.
    pub avg_latency_ms: Option<f64>,
    /// Sample standard deviation of the same latencies (needs two of them).
    pub std_latency_ms: Option<f64>,
    /// Fraction of records that are not hits.
    pub sla_violation_rate: f64,
    pub avg_energy_j: f64,
    pub offload_share: f64,
}

impl SummaryMetrics {
    pub fn from_outcomes(outcomes: &[OutcomeRecord]) -> Self {
        let num_tasks = outcomes.len();
        if num_tasks == 0 {
            return Self::default();
        }

        let count = |status: Status| outcomes.iter().filter(|o| o.status() == status).count();
        let count_decision = |decision: Decision| outcomes.iter().filter(|o| o.decision() == decision).count();
        let hits = count(Status::Hit);

        let latencies: Vec<f64> = outcomes.iter().filter_map(OutcomeRecord::total_latency_ms).collect();
        let avg_latency_ms = mean(&latencies);
        let std_latency_ms = avg_latency_ms.filter(|_| latencies.len() > 1).map(|avg| {
            let squares: f64 = latencies.iter().map(|l| (l - avg).powi(2)).sum();
            (squares / (latencies.len() - 1) as f64).sqrt()
        });

        let energies: Vec<f64> = outcomes.iter().map(OutcomeRecord::energy_j).collect();
        let offloaded = count_decision(Decision::Offload);

        Self {
            num_tasks,
            hits,
            misses: count(Status::Miss),
            drops: count(Status::Drop),
            capacity_drops: count_decision(Decision::DropByCapacity),
            offloaded,
            avg_latency_ms,
            std_latency_ms,
            sla_violation_rate: (num_tasks - hits) as f64 / num_tasks as f64,
            avg_energy_j: mean(&energies).unwrap_or(0.0),
            offload_share: offloaded as f64 / num_tasks as f64,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() { None } else { Some(values.iter().sum::<f64>() / values.len() as f64) }
}

#[derive(Debug, Serialize)]
struct TaskLogRow<'a> {
    task_id: &'a str,
    device_id: &'a str,
    decision: String,
    status: String,
    priority: u8,
    arrival_time_s: f64,
    queue_enter_time_s: f64,
    start_time_s: Option<f64>,
    end_time_s: Option<f64>,
    queue_delay_ms: f64,
    tx_delay_ms: f64,
    proc_delay_ms: f64,
    total_latency_ms: Option<f64>,
    deadline_ms: f64,
    compute_energy_j: f64,
    transmit_energy_j: f64,
    energy_j: f64,
    destination: Option<&'a str>,
    worker: Option<usize>,
    blocking_resource: Option<&'a str>,
}

impl<'a> From<&'a OutcomeRecord> for TaskLogRow<'a> {
    fn from(record: &'a OutcomeRecord) -> Self {
        let energy = record.energy();
        Self {
            task_id: record.task_id().as_str(),
            device_id: record.device_id().as_str(),
            decision: record.decision().to_string(),
            status: record.status().to_string(),
            priority: record.priority(),
            arrival_time_s: record.arrival_time_s(),
            queue_enter_time_s: record.queue_enter_time_s(),
            start_time_s: record.start_time_s(),
            end_time_s: record.end_time_s(),
            queue_delay_ms: record.queue_delay_ms(),
            tx_delay_ms: record.tx_delay_ms(),
            proc_delay_ms: record.proc_delay_ms(),
            total_latency_ms: record.total_latency_ms(),
            deadline_ms: record.deadline_ms(),
            compute_energy_j: energy.compute_j,
            transmit_energy_j: energy.transmit_j,
            energy_j: energy.total_j(),
            destination: record.destination().map(|node| node.as_str()),
            worker: record.worker(),
            blocking_resource: record.blocking_resource(),
        }
    }
}

fn writer(path: &Path) -> Result<csv::Writer<File>> {
    Ok(csv::WriterBuilder::new().delimiter(DELIMITER).from_path(path)?)
}

/// One row per outcome record.
pub fn write_task_log(path: &Path, outcomes: &[OutcomeRecord]) -> Result<()> {
    let mut wtr = writer(path)?;
    for record in outcomes {
        wtr.serialize(TaskLogRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per round with a `<device>_w_local` / `<device>_w_offload` column pair per device.
/// Devices registered after the first snapshot get empty cells in earlier rounds.
pub fn write_weight_log(path: &Path, snapshots: &[WeightSnapshot]) -> Result<()> {
    let mut devices: Vec<_> = snapshots.iter().flat_map(|s| s.weights.keys()).collect();
    devices.sort();
    devices.dedup();

    let mut wtr = writer(path)?;
    let mut header = vec!["round".to_string(), "time_s".to_string()];
    for device in &devices {
        header.push(format!("{}_w_local", device));
        header.push(format!("{}_w_offload", device));
    }
    wtr.write_record(&header)?;

    for snapshot in snapshots {
        let mut row = vec![snapshot.round.to_string(), snapshot.time_s.to_string()];
        for device in &devices {
            match snapshot.weights.get(*device) {
                Some(weight) => {
                    row.push(weight.w_local().to_string());
                    row.push(weight.w_offload().to_string());
                }
                None => row.extend([String::new(), String::new()]),
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_link_statistics(path: &Path, statistics: &[LinkStatistics]) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["resource", "kind", "bandwidth_bps", "active_reservations", "reserved_bits_total", "dropped_bits_total", "drop_count"])?;

    for stat in statistics {
        wtr.write_record(&[
            stat.resource.clone(),
            stat.kind.to_string(),
            stat.bandwidth_bps.to_string(),
            stat.active_reservations.to_string(),
            stat.reserved_bits_total.to_string(),
            stat.dropped_bits_total.to_string(),
            stat.drop_count.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Single-row summary of the run.
pub fn write_summary(path: &Path, policy: &str, summary: &SummaryMetrics, rounds: usize, learner: Option<&LearnerDiagnostics>) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "policy",
        "num_tasks",
        "hits",
        "misses",
        "drops",
        "capacity_drops",
        "offloaded",
        "avg_latency_ms",
        "std_latency_ms",
        "sla_violation_rate",
        "avg_energy_j",
        "offload_share",
        "rounds",
        "final_epsilon",
        "train_steps",
        "last_loss",
    ])?;
    wtr.write_record(&[
        policy.to_string(),
        summary.num_tasks.to_string(),
        summary.hits.to_string(),
        summary.misses.to_string(),
        summary.drops.to_string(),
        summary.capacity_drops.to_string(),
        summary.offloaded.to_string(),
        optional(summary.avg_latency_ms),
        optional(summary.std_latency_ms),
        summary.sla_violation_rate.to_string(),
        summary.avg_energy_j.to_string(),
        summary.offload_share.to_string(),
        rounds.to_string(),
        optional(learner.map(|l| l.epsilon)),
        optional(learner.map(|l| l.train_steps)),
        optional(learner.and_then(|l| l.last_loss)),
    ])?;
    wtr.flush()?;
    Ok(())
}
