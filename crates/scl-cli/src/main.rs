use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scl_orchestrator::{run_single_round, run_tournament, HarnessSettings};

#[derive(Parser)]
#[command(name = "solclash")]
#[command(about = "Deterministic trading-policy tournament runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full tournament from a tournament config file.
    Tournament {
        /// Tournament config (JSON).
        #[arg(long)]
        config: PathBuf,
    },

    /// Run a single round in-process. Also the inner runner invoked inside
    /// the arena container.
    Round {
        /// Arena config (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Bar file (*.json / *.jsonl); optional when the config declares a
        /// synthetic tape source.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Output directory for the round's artifacts.
        #[arg(long)]
        out: PathBuf,

        /// Round number used in artifacts and log paths.
        #[arg(long, default_value_t = 1)]
        round: u32,

        /// Agent manifest files (repeatable).
        #[arg(long = "manifest")]
        manifests: Vec<PathBuf>,

        /// Native policy runner command for manifest agents.
        #[arg(long)]
        harness_cmd: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Fatal errors: one line on stderr, non-zero exit.
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Commands::Tournament { config } => {
            let record = run_tournament(&config).await?;
            for entry in &record.rounds {
                println!(
                    "round {} winner={}",
                    entry.round_num,
                    entry.meta.winner.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Commands::Round {
            config,
            bars,
            out,
            round,
            manifests,
            harness_cmd,
        } => {
            let harness = HarnessSettings {
                cmd: harness_cmd,
                args: vec![],
                compute_unit_limit: None,
            };
            let meta = run_single_round(
                &config,
                bars.as_deref(),
                &manifests,
                &harness,
                round,
                &out,
            )
            .await?;
            println!("winner={}", meta.winner.as_deref().unwrap_or("-"));
            Ok(())
        }
    }
}
