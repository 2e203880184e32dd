//       ,--.  ,--.                  ,--.
//  ,-|  |,-'  '-.,--,--,  ,---. `--',--,--,--.
// ' .-. |'-.  .-'|      \(  .-' ,--.|        |
// \ `-' |  |  |  |  ||  |.-'  `)|  ||  |  |  |
//  `---'   `--'  `--''--'`----' `--'`--`--`--'

// Store-carry-forward message delivery between wandering nodes. Started as a way
// to compare plain flooding against single-target forwarding on the same mobility
// model, the engine itself lives in the library, this file is just the CLI around it.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use dtnsim::metrics::analyzer::{self, AnalysisReport};
use dtnsim::simulation::runner::{self, Runner};
use dtnsim::simulation::{Scenario, SimConfig};
use dtnsim::strategies::StrategyRegistry;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

/// Overrides on top of the scenario preset
#[derive(Args, Clone)]
struct WorldArgs {
    #[arg(short = 'n', long)]
    nodes: Option<u32>,
    #[arg(long)]
    speed: Option<f64>,
    #[arg(short, long)]
    range: Option<f64>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Stop copying a message once it has been delivered (flooding)
    #[arg(long)]
    halt_after_delivery: bool,
}

impl WorldArgs {
    fn apply(&self, mut config: SimConfig) -> SimConfig {
        if let Some(nodes) = self.nodes {
            config = config.with_nodes(nodes);
        }
        if let Some(speed) = self.speed {
            config = config.with_speed(speed);
        }
        if let Some(range) = self.range {
            config = config.with_range(range);
        }
        let width = self.width.unwrap_or(config.area_width);
        let height = self.height.unwrap_or(config.area_height);
        config
            .with_area(width, height)
            .with_continue_after_delivery(!self.halt_after_delivery)
    }
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "single-target")]
        scenario: String,
        #[command(flatten)]
        world: WorldArgs,
        #[arg(short, long, default_value_t = 5000)]
        ticks: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Flooding: inject a random message every N ticks (0 = only the first)
        #[arg(short, long, default_value_t = 50)]
        inject_every: u64,
        /// Pace ticks in wall-clock time like the interactive version
        #[arg(long)]
        realtime: bool,
        /// 1-10, only used with --realtime
        #[arg(long, default_value_t = 5)]
        speed_setting: u32,
        #[arg(short, long, default_value = "results")]
        output: String,
        #[arg(long)]
        no_save: bool,
    },

    Compare {
        #[arg(short, long, default_value = "flooding,single-target")]
        scenarios: String,
        #[command(flatten)]
        world: WorldArgs,
        #[arg(short, long, default_value_t = 3000)]
        ticks: u64,
        #[arg(short, long, default_value_t = 5)]
        repetitions: u32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(short, long, default_value_t = 50)]
        inject_every: u64,
        #[arg(short, long, default_value = "results")]
        output: String,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: String,
    },

    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            world,
            ticks,
            seed,
            inject_every,
            realtime,
            speed_setting,
            output,
            no_save,
        } => {
            let scenario: Scenario = scenario.parse()?;
            let mut config = world.apply(SimConfig::for_scenario(scenario));
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            config.name = format!("{}_{}n", scenario, config.node_count);

            run_single_simulation(config, ticks, inject_every, realtime, speed_setting, &output, no_save).await?;
        }

        Commands::Compare {
            scenarios,
            world,
            ticks,
            repetitions,
            seed,
            inject_every,
            output,
        } => {
            compare_scenarios(&scenarios, &world, ticks, repetitions, seed, inject_every, &output, program_start)?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::List => {
            println!("\nAvailable Replication Strategies");

            let registry = StrategyRegistry::global();
            for strategy in registry.list() {
                let aliases = registry.aliases_of(&strategy);
                let summary = registry.summary(&strategy).unwrap_or_default();
                if aliases.is_empty() {
                    println!("  - {}: {}", strategy, summary);
                } else {
                    println!("  - {} (aka {}): {}", strategy, aliases.join(", "), summary);
                }
            }

            println!("\nScenarios:");
            for scenario in Scenario::all() {
                println!("  - {} (strategy: {})", scenario, scenario.strategy_name());
            }

            println!("\nUsage: cargo run -- run --scenario <name>");
            println!("Example: cargo run -- run --scenario flooding --nodes 20 --ticks 2000\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

async fn run_single_simulation(
    config: SimConfig,
    ticks: u64,
    inject_every: u64,
    realtime: bool,
    speed_setting: u32,
    output: &str,
    no_save: bool,
) -> Result<()> {
    info!("dtnsim: Single Run");

    let name = config.name.clone();
    let runner = Runner::new(config, ticks)?
        .with_injection_interval(inject_every)
        .with_progress(true);

    let outcome = if realtime {
        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.cancel();
            }
        });
        runner.with_speed_setting(speed_setting).run_realtime(cancel).await?
    } else {
        runner.run()?
    };

    for message in &outcome.final_state.messages {
        if message.delivered {
            info!(
                "Message {} ({} -> {}): delivered at tick {} via {:?}",
                message.id,
                message.source,
                message.destination,
                message.delivered_at.unwrap_or_default(),
                message.path
            );
        }
    }

    if !no_save {
        runner::save_results(&outcome, &name, output)?;
    }

    comparison_table(std::slice::from_ref(&outcome.report));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn compare_scenarios(
    scenarios_str: &str,
    world: &WorldArgs,
    ticks: u64,
    repetitions: u32,
    seed: u64,
    inject_every: u64,
    output: &str,
    global_start: Instant,
) -> Result<()> {
    let scenarios = scenarios_str
        .split(',')
        .map(|s| s.trim().parse::<Scenario>())
        .collect::<Result<Vec<_>, _>>()?;

    info!("dtnsim: Comparison");
    info!("Scenarios: {}", scenarios_str);
    info!("Repetitions: {}", repetitions);
    info!("Ticks per run: {}", ticks);

    let mut all_reports = Vec::new();

    for scenario in scenarios {
        info!("Testing: {}", scenario);

        let reports = (0..repetitions)
            .into_par_iter()
            .map(|rep| -> Result<AnalysisReport> {
                let config = world
                    .apply(SimConfig::for_scenario(scenario))
                    .with_seed(seed + rep as u64)
                    .with_name(format!("{}_{}", scenario, rep + 1));
                let outcome = Runner::new(config, ticks)?
                    .with_injection_interval(inject_every)
                    .run()?;
                Ok(outcome.report)
            })
            .collect::<Result<Vec<_>>>()?;

        let elapsed = global_start.elapsed();
        info!("  [{}] {} runs done", format_time(elapsed), reports.len());

        if let Some(avg) = analyzer::average_reports(&reports) {
            all_reports.push(avg);
        }
    }

    comparison_table(&all_reports);

    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let comparison_path = format!("{}/comparison_{}.json", output, timestamp);
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&all_reports)?)?;
    info!("Comparison saved to: {}", comparison_path);

    Ok(())
}

fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

fn analyze_results(path: &str) -> Result<()> {
    use std::fs;

    info!("Analyzing results in: {}", path);

    let mut reports = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let content = fs::read_to_string(&path)?;
        if path.to_string_lossy().contains("analysis") {
            reports.push(serde_json::from_str::<AnalysisReport>(&content)?);
        } else if path.to_string_lossy().contains("comparison") {
            reports.extend(serde_json::from_str::<Vec<AnalysisReport>>(&content)?);
        }
    }

    if reports.is_empty() {
        info!("No analysis files found.");
        return Ok(());
    }

    comparison_table(&reports);

    Ok(())
}

fn comparison_table(reports: &[AnalysisReport]) {
    println!("\n╔═══════════════╦════════╦═══════════╦═══════════╦═══════════╦════════════╦════════════╗");
    println!("║ Scenario      ║ Nodes  ║ Delivered ║ Avg delay ║ Avg hops  ║ Transfers  ║ Avg        ║");
    println!("║               ║        ║ (%)       ║ (ticks)   ║           ║            ║ contacts   ║");
    println!("╠═══════════════╬════════╬═══════════╬═══════════╬═══════════╬════════════╬════════════╣");

    for report in reports {
        println!(
            "║ {:<13} ║ {:>6} ║ {:>8.1}% ║ {:>9.1} ║ {:>9.2} ║ {:>10} ║ {:>10.2} ║",
            report.scenario,
            report.node_count,
            report.delivery_rate * 100.0,
            report.average_delay,
            report.average_hops,
            report.transfers,
            report.avg_contacts,
        );
    }

    println!("╚═══════════════╩════════╩═══════════╩═══════════╩═══════════╩════════════╩════════════╝\n");

    if let Some(best) = reports
        .iter()
        .max_by(|a, b| a.delivery_rate.total_cmp(&b.delivery_rate))
    {
        println!("Best delivery: {} ({:.1}%)", best.scenario, best.delivery_rate * 100.0);
    }

    if let Some(cheapest) = reports.iter().filter(|r| r.messages_delivered > 0).min_by(|a, b| {
        let per_a = a.transfers as f64 / a.messages_delivered as f64;
        let per_b = b.transfers as f64 / b.messages_delivered as f64;
        per_a.total_cmp(&per_b)
    }) {
        println!(
            "Fewest transfers per delivery: {} ({:.1})",
            cheapest.scenario,
            cheapest.transfers as f64 / cheapest.messages_delivered as f64
        );
    }

    println!();
}
