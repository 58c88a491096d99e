//! Command-line interface for chbench
//!
//! # Usage Examples
//!
//! ```bash
//! # Stream the events use case straight into the loader
//! chbench generate --use-case events --scale 1000 --seed 42 \
//!   | chbench load --workers 8 --cache-scope private --batch-size 5000
//!
//! # Decode and count a stream without writing it
//! chbench load -i devops.txt --do-load false
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=info` to see progress.

use chbench::loadtest::{run_generate, run_load, GenerateArgs};
use clap::{Parser, Subcommand};
use loadtest_populate_clickhouse::LoadArgs;

#[derive(Parser)]
#[command(name = "chbench")]
#[command(about = "Generate simulated time-series data and load it into ClickHouse")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a use case and write the interchange stream
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Load an interchange stream into ClickHouse
    Load {
        #[command(flatten)]
        args: LoadArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing; stdout may carry the data stream
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { args } => run_generate(args)?,
        Commands::Load { args } => run_load(args).await?,
    }

    Ok(())
}
