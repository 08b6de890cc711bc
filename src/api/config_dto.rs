use serde::Deserialize;
use std::collections::BTreeMap;

/// Which adaptive policy drives the run. Exactly one is authoritative per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKindDto {
    Score,
    Learned,
}

/// What the pre-admission deadline check compares against the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeadlineCheckDto {
    Queueing,
    QueueingPlusProcessing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPairDto {
    pub w_local: f64,
    pub w_offload: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkDefaultsDto {
    pub bandwidth_bps: f64,
    pub delay_ms: f64,
}

impl Default for LinkDefaultsDto {
    fn default() -> Self {
        Self { bandwidth_bps: 20_000_000.0, delay_ms: 5.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearnedPolicyDto {
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

impl Default for LearnedPolicyDto {
    fn default() -> Self {
        Self {
            replay_capacity: 20_000,
            batch_size: 64,
            min_replay: 200,
            discount: 0.99,
            target_sync_interval: 200,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            optimizer_learning_rate: 1e-3,
            hidden_units: 64,
            drop_penalty: 1.0,
            mean_task_size_kb: 50.0,
            typical_deadline_ms: 2.0,
            lookahead_window_s: 0.1,
        }
    }
}

/// Raw simulation configuration as read from JSON. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfigDto {
    pub num_devices: usize,
    pub device_cpu_hz: f64,
    pub fog_cpu_hz: f64,
    pub cycles_per_byte: f64,
    pub p_tx: f64,
    pub energy_per_cycle: f64,
    pub fog_workers: usize,
    pub round_size: usize,
    pub learning_rate: f64,
    pub initial_weights: WeightPairDto,
    pub safety_factor: f64,
    pub admission_window_s: f64,
    pub access_bandwidth_bps: f64,
    pub link_defaults: LinkDefaultsDto,
    pub deadline_check: DeadlineCheckDto,
    pub policy: PolicyKindDto,
    pub learned: LearnedPolicyDto,
    pub seed: u64,
    pub device_attachments: BTreeMap<String, String>,
    pub require_explicit_attachment: bool,
}

impl Default for SimulationConfigDto {
    fn default() -> Self {
        Self {
            num_devices: 10,
            device_cpu_hz: 1e9,
            fog_cpu_hz: 4e9,
            cycles_per_byte: 100.0,
            p_tx: 0.5,
            energy_per_cycle: 1e-9,
            fog_workers: 4,
            round_size: 100,
            learning_rate: 0.1,
            initial_weights: WeightPairDto { w_local: 0.5, w_offload: 0.5 },
            safety_factor: 1.0,
            admission_window_s: 0.0,
            access_bandwidth_bps: 10_000_000.0,
            link_defaults: LinkDefaultsDto::default(),
            deadline_check: DeadlineCheckDto::Queueing,
            policy: PolicyKindDto::Score,
            learned: LearnedPolicyDto::default(),
            seed: 42,
            device_attachments: BTreeMap::new(),
            require_explicit_attachment: false,
        }
    }
}
