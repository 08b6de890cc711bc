use std::collections::BTreeMap;

use crate::api::config_dto::{DeadlineCheckDto, PolicyKindDto, SimulationConfigDto};
use crate::domain::controller::device_weights::DeviceWeight;
use crate::domain::utils::id::{DeviceId, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Weighted score policy; the rule-based weight controller adapts the weights.
    Score,
    /// Epsilon-greedy over the value approximator; weights stay frozen.
    Learned,
}

impl From<PolicyKindDto> for PolicyKind {
    fn from(dto: PolicyKindDto) -> Self {
        match dto {
            PolicyKindDto::Score => PolicyKind::Score,
            PolicyKindDto::Learned => PolicyKind::Learned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineCheck {
    /// Drop when the queueing delay alone exceeds the deadline.
    Queueing,
    /// Drop when queueing delay plus processing time exceeds the deadline.
    QueueingPlusProcessing,
}

impl From<DeadlineCheckDto> for DeadlineCheck {
    fn from(dto: DeadlineCheckDto) -> Self {
        match dto {
            DeadlineCheckDto::Queueing => DeadlineCheck::Queueing,
            DeadlineCheckDto::QueueingPlusProcessing => DeadlineCheck::QueueingPlusProcessing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnedPolicyConfig {
    pub replay_capacity: usize,
    pub batch_size: usize,
    pub min_replay: usize,
    pub discount: f64,
    pub target_sync_interval: u64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    pub epsilon_decay: f64,
    pub optimizer_learning_rate: f64,
    pub hidden_units: usize,
    pub drop_penalty: f64,
    pub mean_task_size_kb: f64,
    pub typical_deadline_ms: f64,
    pub lookahead_window_s: f64,
}

/// Validated simulation parameters. Built from [`SimulationConfigDto`] via `TryFrom`.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub device_ids: Vec<DeviceId>,
    pub device_cpu_hz: f64,
    pub fog_cpu_hz: f64,
    pub cycles_per_byte: f64,
    pub p_tx: f64,
    pub energy_per_cycle: f64,
    pub fog_workers: usize,
    pub round_size: usize,
    pub learning_rate: f64,
    pub initial_weight: DeviceWeight,
    pub safety_factor: f64,
    pub admission_window_s: f64,
    pub access_bandwidth_bps: f64,
    pub default_link_bandwidth_bps: f64,
    pub default_link_delay_ms: f64,
    pub deadline_check: DeadlineCheck,
    pub policy: PolicyKind,
    pub learned: LearnedPolicyConfig,
    pub seed: u64,
    pub device_attachments: BTreeMap<DeviceId, NodeId>,
    pub require_explicit_attachment: bool,
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition { Ok(()) } else { Err(Error::InvalidConfiguration(message())) }
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    ensure(value.is_finite() && value > 0.0, || format!("{} must be a positive finite number, got {}", name, value))
}

impl TryFrom<SimulationConfigDto> for SimulationConfig {
    type Error = Error;

    fn try_from(dto: SimulationConfigDto) -> Result<Self> {
        ensure_positive("deviceCpuHz", dto.device_cpu_hz)?;
        ensure_positive("fogCpuHz", dto.fog_cpu_hz)?;
        ensure_positive("cyclesPerByte", dto.cycles_per_byte)?;
        ensure_positive("accessBandwidthBps", dto.access_bandwidth_bps)?;
        ensure_positive("linkDefaults.bandwidthBps", dto.link_defaults.bandwidth_bps)?;
        ensure(dto.p_tx.is_finite() && dto.p_tx >= 0.0, || format!("pTx must be non-negative, got {}", dto.p_tx))?;
        ensure(dto.energy_per_cycle.is_finite() && dto.energy_per_cycle >= 0.0, || {
            format!("energyPerCycle must be non-negative, got {}", dto.energy_per_cycle)
        })?;
        ensure(dto.link_defaults.delay_ms.is_finite() && dto.link_defaults.delay_ms >= 0.0, || {
            format!("linkDefaults.delayMs must be non-negative, got {}", dto.link_defaults.delay_ms)
        })?;
        ensure(dto.fog_workers >= 1, || "fogWorkers must be at least 1".to_string())?;
        ensure(dto.round_size >= 1, || "roundSize must be at least 1".to_string())?;
        ensure(dto.learning_rate.is_finite() && dto.learning_rate >= 0.0, || format!("learningRate must be non-negative, got {}", dto.learning_rate))?;
        ensure(dto.safety_factor > 0.0 && dto.safety_factor <= 1.0, || format!("safetyFactor must lie in (0, 1], got {}", dto.safety_factor))?;
        ensure(dto.admission_window_s.is_finite() && dto.admission_window_s >= 0.0, || {
            format!("admissionWindowS must be non-negative, got {}", dto.admission_window_s)
        })?;

        let weights = &dto.initial_weights;
        ensure((weights.w_local + weights.w_offload - 1.0).abs() < 1e-9, || {
            format!("initialWeights must sum to 1, got wLocal={} wOffload={}", weights.w_local, weights.w_offload)
        })?;
        let initial_weight = DeviceWeight::new(weights.w_local)?;

        let learned = &dto.learned;
        ensure(learned.batch_size >= 1, || "learned.batchSize must be at least 1".to_string())?;
        ensure(learned.replay_capacity >= learned.batch_size, || {
            format!("learned.replayCapacity ({}) must hold at least one batch ({})", learned.replay_capacity, learned.batch_size)
        })?;
        ensure(learned.hidden_units >= 1, || "learned.hiddenUnits must be at least 1".to_string())?;
        ensure(learned.target_sync_interval >= 1, || "learned.targetSyncInterval must be at least 1".to_string())?;
        ensure((0.0..=1.0).contains(&learned.discount), || format!("learned.discount must lie in [0, 1], got {}", learned.discount))?;
        ensure(learned.epsilon_decay > 0.0 && learned.epsilon_decay <= 1.0, || {
            format!("learned.epsilonDecay must lie in (0, 1], got {}", learned.epsilon_decay)
        })?;
        ensure(0.0 <= learned.epsilon_end && learned.epsilon_end <= learned.epsilon_start && learned.epsilon_start <= 1.0, || {
            format!("learned epsilon schedule must satisfy 0 <= end <= start <= 1, got start={} end={}", learned.epsilon_start, learned.epsilon_end)
        })?;
        ensure_positive("learned.optimizerLearningRate", learned.optimizer_learning_rate)?;
        ensure_positive("learned.meanTaskSizeKb", learned.mean_task_size_kb)?;
        ensure_positive("learned.typicalDeadlineMs", learned.typical_deadline_ms)?;
        ensure_positive("learned.lookaheadWindowS", learned.lookahead_window_s)?;
        ensure(learned.drop_penalty.is_finite() && learned.drop_penalty >= 0.0, || {
            format!("learned.dropPenalty must be non-negative, got {}", learned.drop_penalty)
        })?;

        let device_ids = (0..dto.num_devices).map(|i| DeviceId::new(format!("dev_{}", i))).collect();
        let device_attachments = dto.device_attachments.into_iter().map(|(device, node)| (DeviceId::new(device), NodeId::new(node))).collect();

        Ok(SimulationConfig {
            device_ids,
            device_cpu_hz: dto.device_cpu_hz,
            fog_cpu_hz: dto.fog_cpu_hz,
            cycles_per_byte: dto.cycles_per_byte,
            p_tx: dto.p_tx,
            energy_per_cycle: dto.energy_per_cycle,
            fog_workers: dto.fog_workers,
            round_size: dto.round_size,
            learning_rate: dto.learning_rate,
            initial_weight,
            safety_factor: dto.safety_factor,
            admission_window_s: dto.admission_window_s,
            access_bandwidth_bps: dto.access_bandwidth_bps,
            default_link_bandwidth_bps: dto.link_defaults.bandwidth_bps,
            default_link_delay_ms: dto.link_defaults.delay_ms,
            deadline_check: dto.deadline_check.into(),
            policy: dto.policy.into(),
            learned: LearnedPolicyConfig {
                replay_capacity: learned.replay_capacity,
                batch_size: learned.batch_size,
                min_replay: learned.min_replay,
                discount: learned.discount,
                target_sync_interval: learned.target_sync_interval,
                epsilon_start: learned.epsilon_start,
                epsilon_end: learned.epsilon_end,
                epsilon_decay: learned.epsilon_decay,
                optimizer_learning_rate: learned.optimizer_learning_rate,
                hidden_units: learned.hidden_units,
                drop_penalty: learned.drop_penalty,
                mean_task_size_kb: learned.mean_task_size_kb,
                typical_deadline_ms: learned.typical_deadline_ms,
                lookahead_window_s: learned.lookahead_window_s,
            },
            seed: dto.seed,
            device_attachments,
            require_explicit_attachment: dto.require_explicit_attachment,
        })
    }
}
