use std::fs;
use std::path::PathBuf;

use offload_sim::api::config_dto::SimulationConfigDto;
use offload_sim::api::task_dto::TaskDto;
use offload_sim::domain::config::{DeadlineCheck, PolicyKind, SimulationConfig};
use offload_sim::domain::task::Task;
use offload_sim::domain::utils::id::{DeviceId, NodeId};
use offload_sim::error::Error;
use offload_sim::{load_simulator, run_from_files};

fn parse(json: &str) -> SimulationConfigDto {
    serde_json::from_str(json).expect("config JSON must parse")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("offload_sim_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const TOPOLOGY: &str = r#"{
    "nodes": [{"id": "n0"}, {"id": "n1"}, {"id": "fog", "isServer": true}],
    "edges": [
        {"source": "n0", "target": "fog", "bandwidthBps": 1e8, "delayMs": 2.0},
        {"source": "n1", "target": "fog"}
    ]
}"#;

fn tasks_jsonl(count: usize) -> String {
    (0..count)
        .map(|i| format!(r#"{{"task_id":"task_{}","device_id":"dev_{}","creation_time_s":{},"size_kb":4.0,"deadline_ms":20.0,"priority":{}}}"#, i, i % 2, i as f64 * 0.01, 1 + i % 2))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_defaults_are_valid() {
    let config = SimulationConfig::try_from(SimulationConfigDto::default()).unwrap();

    assert_eq!(config.device_ids.len(), 10);
    assert_eq!(config.device_ids[9], DeviceId::new("dev_9"));
    assert_eq!(config.round_size, 100);
    assert_eq!(config.policy, PolicyKind::Score);
    assert_eq!(config.deadline_check, DeadlineCheck::Queueing);
    assert_eq!(config.admission_window_s, 0.0);
    assert_eq!(config.initial_weight.w_local(), 0.5);
    assert_eq!(config.learned.hidden_units, 64);
}

#[test]
fn test_partial_camel_case_config_fills_defaults() {
    let dto = parse(
        r#"{
            "numDevices": 3,
            "roundSize": 20,
            "policy": "learned",
            "deadlineCheck": "queueingPlusProcessing",
            "initialWeights": {"wLocal": 0.7, "wOffload": 0.3},
            "linkDefaults": {"delayMs": 1.5},
            "learned": {"batchSize": 8},
            "deviceAttachments": {"dev_0": "n1"}
        }"#,
    );
    let config = SimulationConfig::try_from(dto).unwrap();

    assert_eq!(config.device_ids.len(), 3);
    assert_eq!(config.round_size, 20);
    assert_eq!(config.policy, PolicyKind::Learned);
    assert_eq!(config.deadline_check, DeadlineCheck::QueueingPlusProcessing);
    assert!((config.initial_weight.w_offload() - 0.3).abs() < 1e-12);
    assert_eq!(config.default_link_delay_ms, 1.5);
    assert_eq!(config.default_link_bandwidth_bps, 20_000_000.0);
    assert_eq!(config.learned.batch_size, 8);
    assert_eq!(config.learned.replay_capacity, 20_000);
    assert_eq!(config.device_attachments.get(&DeviceId::new("dev_0")), Some(&NodeId::new("n1")));
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let invalid = [
        r#"{"initialWeights": {"wLocal": 0.7, "wOffload": 0.7}}"#,
        r#"{"initialWeights": {"wLocal": 1.5, "wOffload": -0.5}}"#,
        r#"{"fogWorkers": 0}"#,
        r#"{"roundSize": 0}"#,
        r#"{"safetyFactor": 0.0}"#,
        r#"{"safetyFactor": 1.2}"#,
        r#"{"deviceCpuHz": 0.0}"#,
        r#"{"learned": {"replayCapacity": 4, "batchSize": 8}}"#,
        r#"{"learned": {"epsilonStart": 0.1, "epsilonEnd": 0.5}}"#,
        r#"{"learned": {"discount": 1.5}}"#,
    ];

    for json in invalid {
        let result = SimulationConfig::try_from(parse(json));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))), "{} should be rejected", json);
    }
}

#[test]
fn test_unknown_policy_name_fails_to_parse() {
    assert!(serde_json::from_str::<SimulationConfigDto>(r#"{"policy": "random"}"#).is_err());
}

#[test]
fn test_task_records_are_validated() {
    let valid = TaskDto { task_id: "t0".to_string(), device_id: "dev_0".to_string(), creation_time_s: 0.5, size_kb: 10.0, deadline_ms: 2.0, priority: 2 };
    let task = Task::try_from(valid.clone()).unwrap();
    assert_eq!(task.size_bits(), 10.0 * 1024.0 * 8.0);

    let bad_priority = TaskDto { priority: 3, ..valid.clone() };
    assert!(matches!(Task::try_from(bad_priority), Err(Error::InvalidTask(_))));

    let bad_size = TaskDto { size_kb: 0.0, ..valid.clone() };
    assert!(matches!(Task::try_from(bad_size), Err(Error::InvalidTask(_))));

    let bad_time = TaskDto { creation_time_s: -1.0, ..valid };
    assert!(matches!(Task::try_from(bad_time), Err(Error::InvalidTask(_))));
}

#[test]
fn test_run_from_files_writes_all_reports() {
    let dir = scratch_dir("run");
    let config_path = dir.join("config.json");
    let topology_path = dir.join("topology.json");
    let tasks_path = dir.join("tasks.jsonl");
    let out_dir = dir.join("results");
    fs::write(&config_path, r#"{"numDevices": 2, "roundSize": 4}"#).unwrap();
    fs::write(&topology_path, TOPOLOGY).unwrap();
    fs::write(&tasks_path, tasks_jsonl(10)).unwrap();

    let report = run_from_files(
        Some(config_path.to_str().unwrap()),
        topology_path.to_str().unwrap(),
        tasks_path.to_str().unwrap(),
        &out_dir,
        None,
    )
    .unwrap();

    assert_eq!(report.summary.num_tasks, 10);
    assert_eq!(report.rounds_completed(), 2);
    assert_eq!(report.unadapted_outcomes, 2);

    let task_log = fs::read_to_string(out_dir.join("task_log.csv")).unwrap();
    let mut lines = task_log.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("task_id;device_id;decision;status"));
    assert_eq!(lines.count(), 10);

    let weights = fs::read_to_string(out_dir.join("weights.csv")).unwrap();
    assert_eq!(weights.lines().next().unwrap(), "round;time_s;dev_0_w_local;dev_0_w_offload;dev_1_w_local;dev_1_w_offload");
    assert_eq!(weights.lines().count(), 3);

    let links = fs::read_to_string(out_dir.join("link_stats.csv")).unwrap();
    // Two backbone links and one access link per node.
    assert_eq!(links.lines().count(), 1 + 2 + 3);

    let summary = fs::read_to_string(out_dir.join("summary.csv")).unwrap();
    assert!(summary.lines().nth(1).unwrap().starts_with("score;10;"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_policy_override_and_missing_files() {
    let dir = scratch_dir("override");
    let topology_path = dir.join("topology.json");
    let tasks_path = dir.join("tasks.json");
    fs::write(&topology_path, TOPOLOGY).unwrap();
    fs::write(&tasks_path, format!("[{}]", tasks_jsonl(3).replace('\n', ","))).unwrap();

    let mut sim = load_simulator(None, topology_path.to_str().unwrap(), tasks_path.to_str().unwrap(), Some(PolicyKind::Learned)).unwrap();
    let report = sim.run().unwrap();
    assert_eq!(report.policy, "learned");
    assert_eq!(report.summary.num_tasks, 3);

    let missing = load_simulator(None, dir.join("nope.json").to_str().unwrap(), tasks_path.to_str().unwrap(), None);
    assert!(matches!(missing, Err(Error::IoError(_))));

    fs::remove_dir_all(&dir).unwrap();
}
