use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use offload_sim::domain::config::PolicyKind;
use offload_sim::{logger, run_from_files};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Score,
    Learned,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Score => PolicyKind::Score,
            PolicyArg::Learned => PolicyKind::Learned,
        }
    }
}

/// Discrete-event simulator for device/fog task offloading.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Simulation configuration (JSON). Built-in defaults are used if omitted.
    #[arg(long)]
    config: Option<String>,

    /// Topology with `nodes` and `edges` (JSON).
    #[arg(long)]
    topology: String,

    /// Task stream as JSON lines or a JSON array.
    #[arg(long)]
    tasks: String,

    #[arg(long, default_value = "results")]
    out_dir: PathBuf,

    /// Overrides the policy selected in the configuration.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// error, warn, info, debug or trace. Falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    let report = run_from_files(cli.config.as_deref(), &cli.topology, &cli.tasks, &cli.out_dir, cli.policy.map(PolicyKind::from))
        .with_context(|| format!("simulation with topology '{}' and tasks '{}' failed", cli.topology, cli.tasks))?;

    let summary = &report.summary;
    println!(
        "Simulation done: {} tasks, {} hits, {} misses, {} drops, SLA violation rate {:.4}, {} rounds. Results in '{}'.",
        summary.num_tasks,
        summary.hits,
        summary.misses,
        summary.drops,
        summary.sla_violation_rate,
        report.rounds_completed(),
        cli.out_dir.display()
    );

    Ok(())
}
