use anyhow::Context;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use rail_sim::input;
use rail_sim::simulation::SimConfig;

#[derive(Parser)]
#[command(name = "rail_sim")]
#[command(about = "Judge a rail operating plan by its total passenger delay")]
struct Cli {
    /// Path to the network definition
    #[arg(long, default_value = "input.txt")]
    input: PathBuf,

    /// Path to the plan to judge
    #[arg(long, default_value = "output.txt")]
    output: PathBuf,

    /// Verbose output
    #[arg(long)]
    verbose: bool,

    /// Worker threads used per phase (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "warn,rail_sim=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the plan was accepted
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let mut world = input::parse_network(&cli.input)
        .with_context(|| format!("Can not read input file {}", cli.input.display()))?;
    info!("Read output plans");
    input::parse_plan(&mut world, &cli.output)
        .with_context(|| format!("Can not read plan file {}", cli.output.display()))?;

    let config = SimConfig {
        threads: cli.threads,
    };
    let outcome = config
        .run(&mut world)
        .context("Can not start worker threads")?;

    match outcome {
        Ok(delay) => {
            info!("Printing score");
            println!("{delay}");
            Ok(true)
        }
        Err(rejection) => {
            error!("{rejection}:");
            for e in &rejection.errors {
                if e.is_internal() {
                    error!("{e} (simulator bug, not a plan error)");
                } else {
                    error!("{e}");
                }
            }
            Ok(false)
        }
    }
}
