//! Relay simulator CLI.
//!
//! This binary drives a complete simulation of a traffic generator, the relay, and a
//! timing memory. It performs:
//! 1. **Configuration:** Built-in defaults, optionally overridden by a JSON file and by
//!    command-line flags.
//! 2. **Run:** Delivers events until the system drains or a tick limit is reached.
//! 3. **Report:** Prints the relay's statistics as text sections or as JSON.
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` (e.g. `RUST_LOG=trace`) for
//! per-packet traces.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use gadget_core::common::SimError;
use gadget_core::config::Config;
use gadget_core::sim::simulator::RELAY_NAME;
use gadget_core::stats::STATS_SECTIONS;
use gadget_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "gadget",
    author,
    version,
    about = "Clocked request/response relay simulator",
    long_about = "Run a traffic generator through the relay into a timing memory and report the relay's statistics.\n\nExamples:\n  gadget run\n  gadget run --config relay.json --requests 256\n  gadget run --json --sections ordering"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation and print relay statistics.
    Run {
        /// JSON configuration file; missing fields take their defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the number of requests the generator issues.
        #[arg(short = 'n', long)]
        requests: Option<u64>,

        /// Stop after this simulation tick even if traffic is still in flight.
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Print the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Comma-separated stats sections to print (requests, responses, ordering).
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },

    /// Print the effective configuration as JSON.
    Config {
        /// JSON configuration file to merge over the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            requests,
            max_ticks,
            json,
            sections,
        } => cmd_run(config, requests, max_ticks, json, &sections),
        Commands::Config { config } => cmd_config(config),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("\n[!] {e}");
        process::exit(1);
    }
}

/// Loads the configuration file if given, otherwise the defaults.
fn load_config(path: Option<PathBuf>) -> Result<Config, SimError> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

/// Runs the simulator and prints the outcome.
///
/// Exits with an error on configuration problems or the first protocol fault. An
/// unfinished run (tick limit reached) is reported but is not an error.
fn cmd_run(
    config: Option<PathBuf>,
    requests: Option<u64>,
    max_ticks: Option<u64>,
    json: bool,
    sections: &[String],
) -> Result<(), SimError> {
    let mut config = load_config(config)?;
    if let Some(n) = requests {
        config.traffic.num_requests = n;
    }
    if let Some(unknown) = sections
        .iter()
        .find(|s| !STATS_SECTIONS.contains(&s.as_str()))
    {
        eprintln!(
            "Warning: unknown stats section `{unknown}` (expected one of {})",
            STATS_SECTIONS.join(", ")
        );
    }

    let mut sim = Simulator::new(&config)?;
    let summary = sim.run_to_completion(max_ticks)?;

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error serializing summary: {e}"),
        }
        return Ok(());
    }

    println!(
        "[*] {} after {} ticks ({} events): {} requests issued, {} responses received",
        if summary.completed { "Completed" } else { "Stopped" },
        summary.final_tick,
        summary.events,
        summary.requests_issued,
        summary.responses_received
    );
    println!();
    summary.stats.print_sections(RELAY_NAME, sections);
    Ok(())
}

/// Prints the effective configuration.
fn cmd_config(config: Option<PathBuf>) -> Result<(), SimError> {
    let config = load_config(config)?;
    match serde_json::to_string_pretty(&config) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Error serializing configuration: {e}"),
    }
    Ok(())
}
