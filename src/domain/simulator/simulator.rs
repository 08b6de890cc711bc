use std::collections::BTreeSet;

use crate::api::topology_dto::TopologyDto;
use crate::domain::config::SimulationConfig;
use crate::domain::controller::device_weights::WeightSnapshot;
use crate::domain::controller::weight_controller::{RoundSummary, WeightController};
use crate::domain::learning::deep_q_learner::LearnerDiagnostics;
use crate::domain::network::network_model::{LinkStatistics, NetworkModel};
use crate::domain::network::topology::{LinkDefaults, NetworkTopology};
use crate::domain::outcome::{Decision, EnergyBreakdown, ExecutionTiming, OutcomeRecord, Placement};
use crate::domain::policy::decision::{DecisionOutcome, PolicyDecision};
use crate::domain::policy::decision_policy_trait::DecisionPolicy;
use crate::domain::resource::resource_pool::{SlotGrant, SlotRequest};
use crate::domain::simulator::event_queue::{EventKind, EventQueue};
use crate::domain::simulator::state::SimulationState;
use crate::domain::simulator::time::{s_to_ms, snap_time};
use crate::domain::task::Task;
use crate::domain::utils::id::DeviceId;
use crate::domain::utils::statistics::{ANALYTICS_TARGET, SummaryMetrics};
use crate::error::{Error, Result};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub policy: &'static str,
    pub outcomes: Vec<OutcomeRecord>,
    pub weight_snapshots: Vec<WeightSnapshot>,
    /// One entry per closed round, parallel to `weight_snapshots`.
    pub round_summaries: Vec<RoundSummary>,
    pub link_statistics: Vec<LinkStatistics>,
    pub summary: SummaryMetrics,
    /// Outcomes of the trailing round that never reached the round size.
    pub unadapted_outcomes: usize,
    pub learner: Option<LearnerDiagnostics>,
    pub final_time_s: f64,
}

impl SimulationReport {
    pub fn rounds_completed(&self) -> usize {
        self.weight_snapshots.len()
    }
}

/// Discrete-event driver. Owns the event queue, the virtual clock and all mutable
/// simulation state; processes task arrivals strictly in (time, insertion) order.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    state: SimulationState,
    policy: Box<dyn DecisionPolicy>,
    controller: WeightController,
    events: EventQueue,
    now: f64,

    round_buffer: Vec<OutcomeRecord>,
    outcomes: Vec<OutcomeRecord>,
    weight_snapshots: Vec<WeightSnapshot>,
    round_summaries: Vec<RoundSummary>,
}

impl Simulator {
    /// Builds the topology from its DTO with the configured link defaults.
    pub fn from_topology_dto(config: SimulationConfig, topology: TopologyDto, tasks: Vec<Task>) -> Result<Self> {
        let defaults = LinkDefaults { bandwidth_bps: config.default_link_bandwidth_bps, delay_ms: config.default_link_delay_ms };
        let topology = NetworkTopology::try_from((topology, defaults))?;
        Self::new(config, topology, tasks)
    }

    /// Uses the policy selected by `config.policy`.
    pub fn new(config: SimulationConfig, topology: NetworkTopology, tasks: Vec<Task>) -> Result<Self> {
        let policy = config.policy.get_instance(&config);
        Self::with_policy(config, topology, tasks, policy)
    }

    pub fn with_policy(config: SimulationConfig, topology: NetworkTopology, tasks: Vec<Task>, policy: Box<dyn DecisionPolicy>) -> Result<Self> {
        let network = NetworkModel::new(topology, config.access_bandwidth_bps, config.admission_window_s);

        let mut devices: BTreeSet<DeviceId> = config.device_ids.iter().cloned().collect();
        devices.extend(tasks.iter().map(|task| task.device_id.clone()));
        if network.server_nodes().is_empty() && !devices.is_empty() {
            return Err(Error::NoServerCandidates);
        }

        let mut state = SimulationState::new(&config, network);
        for device in &config.device_ids {
            state.attachment_of(device)?;
        }

        let mut events = EventQueue::new();
        let task_count = tasks.len();
        for task in tasks {
            events.push(task.creation_time_s, EventKind::TaskArrival(task));
        }

        log::info!(
            "Simulator ready: {} tasks, {} configured devices, {} nodes ({} servers), {} links, policy '{}'.",
            task_count,
            config.device_ids.len(),
            state.network.topology().node_count(),
            state.network.server_nodes().len(),
            state.network.topology().link_count(),
            policy.name()
        );

        Ok(Self {
            controller: WeightController::new(config.learning_rate),
            config,
            state,
            policy,
            events,
            now: 0.0,
            round_buffer: Vec::new(),
            outcomes: Vec::new(),
            weight_snapshots: Vec::new(),
            round_summaries: Vec::new(),
        })
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Direct access to the mutable state, e.g. to pre-load reservations or busy devices.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn outcomes(&self) -> &[OutcomeRecord] {
        &self.outcomes
    }

    pub fn weight_snapshots(&self) -> &[WeightSnapshot] {
        &self.weight_snapshots
    }

    pub fn round_summaries(&self) -> &[RoundSummary] {
        &self.round_summaries
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn schedule_task(&mut self, task: Task) -> u64 {
        self.events.push(task.creation_time_s, EventKind::TaskArrival(task))
    }

    /// Processes the next event. Returns `false` once the queue is exhausted.
    pub fn step(&mut self) -> Result<bool> {
        let Some(event) = self.events.pop() else {
            return Ok(false);
        };
        self.now = event.time_s;

        match event.kind {
            EventKind::TaskArrival(task) => self.handle_arrival(task)?,
        }

        Ok(true)
    }

    /// Drains the event queue and collects the report.
    pub fn run(&mut self) -> Result<SimulationReport> {
        while self.step()? {}

        if !self.round_buffer.is_empty() {
            log::info!("{} outcomes of the incomplete last round were not used for adaptation.", self.round_buffer.len());
        }

        let link_statistics = self.state.network.link_statistics(self.now);
        let summary = SummaryMetrics::from_outcomes(&self.outcomes);
        let learner = self.policy.diagnostics();

        tracing::info!(
            target: ANALYTICS_TARGET,
            Time = self.now,
            LogDescription = "Run finished",
            Policy = self.policy.name(),
            NumberOfTasks = summary.num_tasks as u64,
            Rounds = self.weight_snapshots.len() as u64,
            AvgLatencyMs = ?summary.avg_latency_ms,
            SlaViolationRate = summary.sla_violation_rate,
            AvgEnergyJ = summary.avg_energy_j,
            Drops = summary.drops as u64,
        );
        log::info!(
            "Run finished at t={:.6}s: {} tasks, {} hits, {} misses, {} drops, {} rounds.",
            self.now,
            summary.num_tasks,
            summary.hits,
            summary.misses,
            summary.drops,
            self.weight_snapshots.len()
        );

        Ok(SimulationReport {
            policy: self.policy.name(),
            outcomes: self.outcomes.clone(),
            weight_snapshots: self.weight_snapshots.clone(),
            round_summaries: self.round_summaries.clone(),
            link_statistics,
            summary,
            unadapted_outcomes: self.round_buffer.len(),
            learner,
            final_time_s: self.now,
        })
    }

    fn handle_arrival(&mut self, task: Task) -> Result<()> {
        let now = self.now;
        self.state.register_device(&task.device_id);

        let decision = self.policy.decide(&task, now, &mut self.state)?;
        log::debug!("t={:.6}s task {} from {}: {} ({}).", now, task.id, task.device_id, decision.decision(), decision.reason);

        let record = self.execute(&task, decision, now)?;
        self.policy.observe(&task, &record, now, &mut self.state)?;
        self.finalize(record);

        Ok(())
    }

    fn execute(&mut self, task: &Task, decision: PolicyDecision, now: f64) -> Result<OutcomeRecord> {
        match decision.outcome {
            DecisionOutcome::Local => Ok(self.execute_local(task, now)),
            DecisionOutcome::Offload(route) => {
                self.execute_remote(task, now, route.transfer_time_s, Placement { destination: Some(route.destination), worker: None })
            }
            DecisionOutcome::DropByCapacity { blocking, destination } => Ok(OutcomeRecord::dropped_by_capacity(task, now, &blocking, Some(destination))),
        }
    }

    fn execute_local(&mut self, task: &Task, now: f64) -> OutcomeRecord {
        let (proc_ms, cycles) = self.state.compute.local_processing_ms(task.size_kb);
        let request = SlotRequest {
            ready_at_s: now,
            created_at_s: task.creation_time_s,
            processing_ms: proc_ms,
            deadline_ms: task.deadline_ms,
            deadline_check: self.state.deadline_check,
        };

        match self.state.devices.try_reserve(&task.device_id, &request) {
            SlotGrant::Granted(slot) => {
                let timing = ExecutionTiming {
                    start_s: slot.start_s,
                    end_s: slot.end_s,
                    queue_delay_ms: slot.queue_delay_ms,
                    tx_delay_ms: 0.0,
                    proc_delay_ms: proc_ms,
                    total_latency_ms: s_to_ms(slot.end_s - task.creation_time_s),
                };
                let energy = EnergyBreakdown { compute_j: self.state.compute.model.compute_energy_j(cycles), transmit_j: 0.0 };
                OutcomeRecord::completed(task, Decision::Local, now, timing, energy, Placement::default())
            }
            SlotGrant::Rejected { queue_delay_ms } => OutcomeRecord::dropped_by_deadline(task, Decision::Local, now, queue_delay_ms, 0.0, Placement::default()),
        }
    }

    /// The transfer is already admitted and reserved; the task reaches the fog tier after
    /// the serial relay time and queues on the earliest free worker.
    fn execute_remote(&mut self, task: &Task, now: f64, transfer_time_s: f64, mut placement: Placement) -> Result<OutcomeRecord> {
        let (proc_ms, cycles) = self.state.compute.remote_processing_ms(task.size_kb);
        let tx_delay_ms = s_to_ms(transfer_time_s);
        let request = SlotRequest {
            ready_at_s: snap_time(now + transfer_time_s),
            created_at_s: task.creation_time_s,
            processing_ms: proc_ms,
            deadline_ms: task.deadline_ms,
            deadline_check: self.state.deadline_check,
        };

        let (worker, grant) = self.state.fog.try_reserve(&request).ok_or_else(|| Error::InvalidConfiguration("the fog tier has no workers".to_string()))?;
        placement.worker = Some(worker);

        let record = match grant {
            SlotGrant::Granted(slot) => {
                let timing = ExecutionTiming {
                    start_s: slot.start_s,
                    end_s: slot.end_s,
                    queue_delay_ms: slot.queue_delay_ms,
                    tx_delay_ms,
                    proc_delay_ms: proc_ms,
                    total_latency_ms: s_to_ms(slot.end_s - task.creation_time_s),
                };
                let model = &self.state.compute.model;
                let energy = EnergyBreakdown { compute_j: model.compute_energy_j(cycles), transmit_j: model.transmit_energy_j(transfer_time_s) };
                OutcomeRecord::completed(task, Decision::Offload, now, timing, energy, placement)
            }
            SlotGrant::Rejected { queue_delay_ms } => OutcomeRecord::dropped_by_deadline(task, Decision::Offload, now, queue_delay_ms, tx_delay_ms, placement),
        };

        Ok(record)
    }

    fn finalize(&mut self, record: OutcomeRecord) {
        self.outcomes.push(record.clone());
        self.round_buffer.push(record);

        if self.round_buffer.len() >= self.config.round_size {
            self.close_round();
        }
    }

    /// Feeds exactly one full round to the weight controller (if the policy uses adaptive
    /// weights) and snapshots the weights.
    fn close_round(&mut self) {
        let round = std::mem::take(&mut self.round_buffer);
        let summary = if self.policy.uses_adaptive_weights() {
            self.controller.update_weights(&round, &mut self.state.weights)
        } else {
            WeightController::summarize(&round)
        };

        let index = self.weight_snapshots.len() + 1;
        self.weight_snapshots.push(self.state.weights.snapshot(index, self.now));
        self.round_summaries.push(summary);

        tracing::info!(
            target: ANALYTICS_TARGET,
            Time = self.now,
            LogDescription = "Round closed",
            Round = index as u64,
            NumberOfTasks = round.len() as u64,
            LocalViolationRate = summary.local.violation_rate(),
            OffloadViolationRate = summary.offload.violation_rate(),
            CapacityDrops = summary.capacity_drops as u64,
            AdjustedRecords = summary.adjusted_records as u64,
        );
        log::info!(
            "Round {} closed at t={:.6}s: local violation {:.3}, offload violation {:.3}, {} weight adjustments.",
            index,
            self.now,
            summary.local.violation_rate(),
            summary.offload.violation_rate(),
            summary.adjusted_records
        );
    }
}
