//! llt-sim — run one fleet simulation and write per-node CSV metrics.
//!
//! ```text
//! llt-sim --CSVfileName out.csv --nodes 5 --totalTime 250 --seed 1
//! ```
//!
//! Exit code 0 on completion; any output I/O failure is fatal and non-zero.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use llt_core::{SimConfig, SimTime};
use llt_sim::Experiment;
use log::info;

/// Fleet simulator: Markov mobility, two-interface discovery, and
/// deadline-driven task offloading.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base name of the per-node CSV output files.
    #[arg(long = "CSVfileName", default_value = "manet-sim.output.csv")]
    csv_file_name: String,

    /// Write a mobility course-change trace.
    #[arg(long = "traceMobility", default_value_t = true, action = clap::ArgAction::Set)]
    trace_mobility: bool,

    /// Routing protocol selector.  Reserved; the simulator ignores it.
    #[arg(long = "protocol", default_value_t = 0)]
    protocol: u32,

    /// Fleet size.
    #[arg(long, default_value_t = 5)]
    nodes: u16,

    /// Simulated run length, seconds.
    #[arg(long = "totalTime", default_value_t = 250)]
    total_time_secs: u64,

    /// Master RNG seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Directory the CSV files land in.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Try allocation candidates in descending peer-CPU-speed order.
    #[arg(long, default_value_t = false)]
    sort_by_cpu: bool,

    /// Bound transfer windows by the deadline alone, ignoring link
    /// lifetimes.
    #[arg(long, default_value_t = false)]
    use_max_cpu: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let _ = args.protocol; // parsed for compatibility, not consumed

    let config = SimConfig {
        nodes: args.nodes,
        total_time: SimTime::from_secs(args.total_time_secs),
        seed: args.seed,
        csv_file_name: args.csv_file_name.clone(),
        trace_mobility: args.trace_mobility,
        alloc: llt_core::AllocOptions {
            sort_by_cpu_speed: args.sort_by_cpu,
            use_max_cpu: args.use_max_cpu,
        },
        ..SimConfig::default()
    };

    info!(
        "running {} nodes for {}s (seed {})",
        config.nodes, args.total_time_secs, config.seed
    );

    let mut experiment = Experiment::new(config, Some(&args.output_dir))
        .context("experiment bring-up failed")?;
    experiment.run().context("simulation run failed")?;

    for s in experiment.summary() {
        println!(
            "node {}: {} tasks assigned, {} succeeded, {} failed",
            s.node.0, s.tasks_assigned, s.tasks_succeeded, s.tasks_failed
        );
    }
    let (sent, delivered) = experiment.transferred_bytes();
    println!("app traffic: {sent} bytes sent, {delivered} delivered");

    Ok(())
}
