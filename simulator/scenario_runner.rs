// Scenario Runner - Load and execute scenario YAML files
//
// Each scenario names one or more traces and, per trace, the trust algorithms
// and malicious strategies to replay it under. Every combination is run and a
// comparison table of good-user success rates is printed at the end.
//
// Usage:
//   cargo run --bin scenario_runner scenarios/collusion.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/collusion.yaml --seed 42

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use indexmap::IndexMap;
use log::{info, LevelFilter};
use serde::Deserialize;
use simple_logger::SimpleLogger;

use tm_rust::{load_trace, save_report, Algorithm, MaliciousStrategy, SimResult, Simulator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run batches of trace replays from YAML scenario files", long_about = None)]
struct Cli {
    /// Scenario file, or a directory of them
    path: PathBuf,

    /// Overrides the seed given in the scenario files
    #[clap(long)]
    seed: Option<u64>,

    #[clap(long, default_value = "warn")]
    log_level: String,
}

/// Scenario file format
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Simulator seed shared by every run; random when absent
    #[serde(default)]
    seed: Option<u64>,

    /// Where reports go; nothing is written when absent
    #[serde(default)]
    output_dir: Option<PathBuf>,

    runs: Vec<RunSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunSpec {
    /// Trace path, relative to the scenario file
    trace: PathBuf,

    #[serde(default = "default_algorithms")]
    algorithms: Vec<String>,

    #[serde(default = "default_strategies")]
    strategies: Vec<String>,
}

fn default_algorithms() -> Vec<String> {
    Algorithm::ALL
        .iter()
        .map(|alg| alg.short_name().to_string())
        .collect()
}

fn default_strategies() -> Vec<String> {
    MaliciousStrategy::ALL
        .iter()
        .map(|s| s.name().to_ascii_lowercase())
        .collect()
}

// (trace, algorithm) -> strategy -> result
type ResultTable = IndexMap<(String, &'static str), IndexMap<&'static str, SimResult>>;

fn main() {
    let cli = Cli::parse();

    let level: LevelFilter = cli.log_level.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}'", cli.log_level);
        process::exit(1);
    });
    SimpleLogger::new().with_level(level).init().unwrap_or_else(|e| {
        eprintln!("Failed to initialise logging: {}", e);
        process::exit(1);
    });

    if cli.path.is_file() {
        run_scenario_file(&cli.path, cli.seed);
    } else if cli.path.is_dir() {
        run_scenario_directory(&cli.path, cli.seed);
    } else {
        eprintln!("Error: Path does not exist: {}", cli.path.display());
        process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<u64>) {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn run_scenario_file(path: &Path, seed_override: Option<u64>) {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        process::exit(1);
    });

    println!("\n╔════════════════════════════════════════════════════════╗");
    let title = scenario.meta.name.clone().unwrap_or_else(|| {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");
        format!("Scenario: {}", stem)
    });
    println!("║  {}{}║", title, " ".repeat(54_usize.saturating_sub(title.chars().count())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let seed = seed_override.or(scenario.seed);
    let output_dir = scenario.output_dir.as_ref().map(|dir| base_dir.join(dir));
    if let Some(ref dir) = output_dir {
        fs::create_dir_all(dir).unwrap_or_else(|e| {
            eprintln!("Failed to create {}: {}", dir.display(), e);
            process::exit(1);
        });
    }

    let mut table: ResultTable = IndexMap::new();

    for run in &scenario.runs {
        let trace_path = base_dir.join(&run.trace);
        let trace = load_trace(&trace_path).unwrap_or_else(|e| {
            eprintln!("Failed to load {}: {}", trace_path.display(), e);
            process::exit(1);
        });
        let trace_name = trace_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("trace")
            .to_string();

        println!("Trace {}:", trace_path.display());
        println!(
            "  Peers: {} ({} good, {} malicious)",
            trace.params.num_users,
            trace.params.usr_good,
            trace.params.malicious()
        );
        println!(
            "  Transactions: {} (+{} warm-up)\n",
            trace.params.num_trans, trace.params.warmup
        );

        for alg_name in &run.algorithms {
            let algorithm = Algorithm::from_name(alg_name);
            for strategy_name in &run.strategies {
                let strategy = MaliciousStrategy::from_name(strategy_name);

                let simulator = Simulator::new(
                    trace.params.clone(),
                    trace.build_network(),
                    algorithm,
                    strategy,
                    seed,
                );
                info!(
                    "{}: {} / {} (seed {})",
                    trace_name,
                    simulator.algorithm_name(),
                    strategy.name(),
                    simulator.seed()
                );

                let result = simulator.run(&trace.requests).unwrap_or_else(|e| {
                    eprintln!("Simulation of {} failed: {}", trace_path.display(), e);
                    process::exit(1);
                });

                if let Some(ref dir) = output_dir {
                    let report = dir.join(format!(
                        "{}-{}.{}",
                        trace_name,
                        strategy.name().to_ascii_lowercase(),
                        result.extension
                    ));
                    save_report(&result, &report).unwrap_or_else(|e| {
                        eprintln!("Failed to write {}: {}", report.display(), e);
                        process::exit(1);
                    });
                }

                println!(
                    "  {:<24} {:<11} good success {:>6.1}%",
                    result.algorithm,
                    strategy.name(),
                    result.stats.good_success_rate() * 100.0
                );

                table
                    .entry((trace_name.clone(), result.algorithm))
                    .or_default()
                    .insert(strategy.name(), result);
            }
        }
        println!();
    }

    print_comparison(&table);

    println!("\n✓ Scenario complete!\n");
}

fn print_comparison(table: &ResultTable) {
    let mut strategies: Vec<&'static str> = Vec::new();
    for row in table.values() {
        for name in row.keys() {
            if !strategies.contains(name) {
                strategies.push(*name);
            }
        }
    }

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║  Good-User Success Rate                                ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    print!("  {:<16} {:<24}", "Trace", "Algorithm");
    for name in &strategies {
        print!(" {:>11}", name);
    }
    println!();

    for ((trace, algorithm), row) in table {
        print!("  {:<16} {:<24}", trace, algorithm);
        for name in &strategies {
            match row.get(name) {
                Some(result) => print!(" {:>10.1}%", result.stats.good_success_rate() * 100.0),
                None => print!(" {:>11}", "-"),
            }
        }
        println!();
    }
}
