//! `invoke-kernel` command line

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use invoke_kernel::settings::InvokeConfig;
use invoke_kernel::telemetry::init_tracing;
use invoke_kernel::test_harness::{run_simulator, SimulatorConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("invoke-kernel")
        .version(invoke_kernel::VERSION)
        .about("Plan-time engine for explicitly invoked actions")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run seeded invoke walks and check pipeline guarantees")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("scenarios")
                        .long("scenarios")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Number of walks to simulate"),
                )
                .arg(
                    Arg::new("max-instances")
                        .long("max-instances")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Upper bound on instances per action"),
                )
                .arg(
                    Arg::new("fault-rate")
                        .long("fault-rate")
                        .default_value("0.3")
                        .value_parser(value_parser!(f64))
                        .help("Probability that an instance is given a fault"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        );

    let matches = cli.get_matches();

    let settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => InvokeConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => InvokeConfig::default(),
    };
    init_tracing(&settings);

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let fault_rate = args.get_one::<f64>("fault-rate").copied().unwrap_or(0.3);
            anyhow::ensure!(
                (0.0..=1.0).contains(&fault_rate),
                "--fault-rate must be between 0 and 1, got {fault_rate}"
            );

            let defaults = SimulatorConfig::default();
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                scenarios: args.get_one::<u64>("scenarios").copied().unwrap_or(defaults.scenarios),
                max_instances: args
                    .get_one::<usize>("max-instances")
                    .copied()
                    .unwrap_or(defaults.max_instances),
                fault_rate,
                parallelism: settings.parallelism,
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                ..defaults
            };

            println!("Running invoke simulator...");
            println!("Seed: {}", config.seed);
            println!("Scenarios: {}", config.scenarios);
            println!("Parallelism: {}", config.parallelism);
            println!();

            let report = run_simulator(config).await;
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        _ => {
            println!("invoke-kernel {}", invoke_kernel::VERSION);
            println!("Run `invoke-kernel simulate --help` for usage.");
        }
    }

    Ok(())
}
