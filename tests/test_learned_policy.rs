mod common;

use common::{config, config_dto, simulator, star_topology, task, task_stream};
use offload_sim::api::config_dto::{LearnedPolicyDto, PolicyKindDto, SimulationConfigDto};
use offload_sim::domain::network::network_model::BlockingResource;
use offload_sim::domain::outcome::{Decision, EnergyBreakdown, ExecutionTiming, OutcomeRecord, Placement};
use offload_sim::domain::policy::features::{FeatureScales, RouteContext, build_state};
use offload_sim::domain::policy::learned_policy::LearnedPolicy;
use offload_sim::domain::utils::id::{DeviceId, NodeId};

fn learned_config() -> SimulationConfigDto {
    SimulationConfigDto {
        policy: PolicyKindDto::Learned,
        learned: LearnedPolicyDto {
            replay_capacity: 16,
            batch_size: 4,
            min_replay: 4,
            target_sync_interval: 2,
            hidden_units: 8,
            epsilon_start: 1.0,
            epsilon_end: 0.1,
            epsilon_decay: 0.9,
            ..Default::default()
        },
        ..config_dto()
    }
}

#[test]
fn test_learned_run_trains_and_freezes_weights() {
    let mut sim = simulator(learned_config(), star_topology(1e8), task_stream(40, 2));

    let report = sim.run().unwrap();

    assert_eq!(report.policy, "learned");
    assert_eq!(report.summary.num_tasks, 40);

    let learner = report.learner.expect("the learned policy reports diagnostics");
    assert_eq!(learner.stored_transitions, 40);
    assert_eq!(learner.train_steps, 37, "Training starts once the replay buffer holds one batch.");
    assert_eq!(learner.target_syncs, 18);
    assert_eq!(learner.epsilon, 0.1);
    assert!(learner.last_loss.is_some_and(f64::is_finite));

    assert_eq!(report.rounds_completed(), 4);
    for snapshot in &report.weight_snapshots {
        assert!(snapshot.weights.values().all(|w| w.w_local() == 0.5), "Weights must stay frozen under the learned policy.");
    }
}

#[test]
fn test_same_seed_gives_same_decisions() {
    let decisions = || {
        let mut sim = simulator(learned_config(), star_topology(1e8), task_stream(30, 2));
        sim.run().unwrap().outcomes.iter().map(|o| o.decision()).collect::<Vec<Decision>>()
    };

    assert_eq!(decisions(), decisions());
}

#[test]
fn test_reward_normalizes_latency_and_penalizes_drops() {
    let cfg = config(learned_config());
    let policy = LearnedPolicy::new(&cfg.learned, 7);

    let on_time = task("t0", "dev_0", 0.0, 1.0, 10.0);
    let timing = ExecutionTiming { start_s: 0.0, end_s: 0.005, queue_delay_ms: 0.0, tx_delay_ms: 0.0, proc_delay_ms: 5.0, total_latency_ms: 5.0 };
    let hit = OutcomeRecord::completed(&on_time, Decision::Local, 0.0, timing, EnergyBreakdown::default(), Placement::default());
    assert_eq!(policy.reward(&hit), -0.5);

    let blocked = OutcomeRecord::dropped_by_capacity(&on_time, 0.0, &BlockingResource::AccessLink(NodeId::new("n0")), None);
    assert_eq!(policy.reward(&blocked), -1.0);

    let late = task("t1", "dev_0", 0.0, 1.0, 50.0);
    let queued = OutcomeRecord::dropped_by_deadline(&late, Decision::Local, 0.0, 100.0, 0.0, Placement::default());
    assert_eq!(policy.reward(&queued), -3.0);

    let zero_deadline = task("t2", "dev_0", 0.0, 1.0, 0.0);
    let missed = OutcomeRecord::completed(&zero_deadline, Decision::Local, 0.0, timing, EnergyBreakdown::default(), Placement::default());
    assert!(policy.reward(&missed).is_finite());
}

#[test]
fn test_state_vector_layout() {
    let mut sim = simulator(learned_config(), star_topology(1e8), vec![]);
    let state = sim.state_mut();
    state.devices.set_free_at(&DeviceId::new("dev_0"), 1.0);
    let scales = FeatureScales { mean_task_size_kb: 50.0, typical_deadline_ms: 2.0, lookahead_window_s: 0.1 };

    let features = build_state(&task("t0", "dev_0", 0.0, 25.0, 1.0), 0.0, state, &RouteContext::default(), &scales);

    assert_eq!(features, [0.5, 0.5, 1.0, 0.0, 0.0, 0.0]);
}
