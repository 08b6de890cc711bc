#![allow(dead_code)]

use offload_sim::api::config_dto::{SimulationConfigDto, WeightPairDto};
use offload_sim::api::topology_dto::{EdgeDto, NodeDto, TopologyDto};
use offload_sim::domain::config::SimulationConfig;
use offload_sim::domain::simulator::simulator::Simulator;
use offload_sim::domain::task::Task;
use offload_sim::domain::utils::id::{DeviceId, TaskId};

/// 1 KB at 100 cycles/byte takes exactly 5 ms on this clock.
pub const FIVE_MS_PER_KB_HZ: f64 = 20_480_000.0;

pub fn node(id: &str, is_server: bool) -> NodeDto {
    NodeDto { id: id.to_string(), is_server }
}

pub fn edge(source: &str, target: &str, bandwidth_bps: f64, delay_ms: f64) -> EdgeDto {
    EdgeDto { source: source.to_string(), target: target.to_string(), bandwidth_bps: Some(bandwidth_bps), delay_ms: Some(delay_ms) }
}

/// Two device nodes (`n0`, `n1`) hanging off one fog server.
pub fn star_topology(bandwidth_bps: f64) -> TopologyDto {
    TopologyDto {
        nodes: vec![node("n0", false), node("n1", false), node("fog", true)],
        edges: vec![edge("n0", "fog", bandwidth_bps, 2.0), edge("n1", "fog", bandwidth_bps, 2.0)],
    }
}

pub fn config_dto() -> SimulationConfigDto {
    SimulationConfigDto { num_devices: 2, round_size: 10, ..Default::default() }
}

/// Weights that make the score policy always pick local execution.
pub fn always_local(mut dto: SimulationConfigDto) -> SimulationConfigDto {
    dto.initial_weights = WeightPairDto { w_local: 0.0, w_offload: 1.0 };
    dto
}

/// Weights that make the score policy always attempt to offload.
pub fn always_offload(mut dto: SimulationConfigDto) -> SimulationConfigDto {
    dto.initial_weights = WeightPairDto { w_local: 1.0, w_offload: 0.0 };
    dto
}

pub fn config(dto: SimulationConfigDto) -> SimulationConfig {
    SimulationConfig::try_from(dto).expect("test configuration must be valid")
}

pub fn task(id: &str, device: &str, creation_time_s: f64, size_kb: f64, deadline_ms: f64) -> Task {
    Task { id: TaskId::new(id), device_id: DeviceId::new(device), creation_time_s, size_kb, deadline_ms, priority: 1 }
}

/// `count` small tasks spread over `devices`, one every 10 ms.
pub fn task_stream(count: usize, devices: usize) -> Vec<Task> {
    (0..count).map(|i| task(&format!("task_{}", i), &format!("dev_{}", i % devices), i as f64 * 0.01, 1.0, 50.0)).collect()
}

pub fn simulator(dto: SimulationConfigDto, topology: TopologyDto, tasks: Vec<Task>) -> Simulator {
    Simulator::from_topology_dto(config(dto), topology, tasks).expect("simulator must build")
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
