use std::fs;
use std::path::Path;

use crate::api::config_dto::SimulationConfigDto;
use crate::api::task_dto::TaskDto;
use crate::api::topology_dto::TopologyDto;
use crate::domain::config::{PolicyKind, SimulationConfig};
use crate::domain::simulator::simulator::{SimulationReport, Simulator};
use crate::domain::task::Task;
use crate::domain::utils::statistics;
use crate::error::Result;
use crate::loader::parser::{parse_json_file, parse_json_records};

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads the configuration (defaults if `config_path` is `None`), the topology and the
/// task stream, and builds a ready-to-run simulator.
pub fn load_simulator(config_path: Option<&str>, topology_path: &str, tasks_path: &str, policy: Option<PolicyKind>) -> Result<Simulator> {
    let config_dto = match config_path {
        Some(path) => {
            log::info!("Loading configuration from '{}'.", path);
            parse_json_file::<SimulationConfigDto>(path)?
        }
        None => SimulationConfigDto::default(),
    };
    let mut config = SimulationConfig::try_from(config_dto)?;
    if let Some(policy) = policy {
        config.policy = policy;
    }

    log::info!("Loading topology from '{}'.", topology_path);
    let topology_dto: TopologyDto = parse_json_file(topology_path)?;

    log::info!("Loading tasks from '{}'.", tasks_path);
    let tasks = parse_json_records::<TaskDto>(tasks_path)?.into_iter().map(Task::try_from).collect::<Result<Vec<_>>>()?;
    log::info!("{} tasks parsed successfully.", tasks.len());

    Simulator::from_topology_dto(config, topology_dto, tasks)
}

/// Writes `task_log.csv`, `weights.csv`, `link_stats.csv` and `summary.csv` into `out_dir`.
pub fn write_report(out_dir: &Path, report: &SimulationReport) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    statistics::write_task_log(&out_dir.join("task_log.csv"), &report.outcomes)?;
    statistics::write_weight_log(&out_dir.join("weights.csv"), &report.weight_snapshots)?;
    statistics::write_link_statistics(&out_dir.join("link_stats.csv"), &report.link_statistics)?;
    statistics::write_summary(&out_dir.join("summary.csv"), report.policy, &report.summary, report.rounds_completed(), report.learner.as_ref())?;

    log::info!("Results written to '{}'.", out_dir.display());
    Ok(())
}

pub fn run_from_files(config_path: Option<&str>, topology_path: &str, tasks_path: &str, out_dir: &Path, policy: Option<PolicyKind>) -> Result<SimulationReport> {
    let mut simulator = load_simulator(config_path, topology_path, tasks_path, policy)?;
    let report = simulator.run()?;
    write_report(out_dir, &report)?;
    Ok(report)
}
