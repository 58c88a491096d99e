//! Generate command handler: simulate a use case and write the interchange stream.

use crate::config::parse_duration;
use anyhow::Context;
use bench_core::InterchangeWriter;
use chrono::{DateTime, Utc};
use clap::Args;
use loadtest_generator::generator::{DEFAULT_TENANT_POOL, DEFAULT_USER_POOL};
use loadtest_generator::{DataGenerator, GeneratorConfig, UseCase};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Data generation arguments.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Use case to simulate (devops, events)
    #[arg(long, default_value = "devops")]
    pub use_case: UseCase,

    /// Number of simulated entities
    #[arg(long, default_value = "1")]
    pub scale: u64,

    /// Random seed for deterministic generation
    #[arg(long, env = "CHBENCH_SEED", default_value = "0")]
    pub seed: u64,

    /// First simulated instant (RFC 3339)
    #[arg(long, default_value = "2016-01-01T00:00:00Z")]
    pub timestamp_start: String,

    /// End of the simulation, exclusive (RFC 3339)
    #[arg(long, default_value = "2016-01-02T00:00:00Z")]
    pub timestamp_end: String,

    /// Simulated time between two samples of an entity (e.g. 10s, 5m)
    #[arg(long, default_value = "10s")]
    pub log_interval: String,

    /// Number of known users (events use case)
    #[arg(long, default_value_t = DEFAULT_USER_POOL)]
    pub user_pool: usize,

    /// Number of known tenants (events use case)
    #[arg(long, default_value_t = DEFAULT_TENANT_POOL)]
    pub tenant_pool: usize,

    /// Output file (stdout when absent)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Stop after this many rows
    #[arg(long)]
    pub limit: Option<u64>,
}

fn parse_timestamp(name: &str, value: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid {name} '{value}' (expected RFC 3339)"))
}

impl GenerateArgs {
    pub fn to_config(&self) -> anyhow::Result<GeneratorConfig> {
        let start = parse_timestamp("timestamp-start", &self.timestamp_start)?;
        let end = parse_timestamp("timestamp-end", &self.timestamp_end)?;

        let mut config = GeneratorConfig::new(self.use_case, self.scale, start, end);
        config.seed = self.seed;
        config.interval = parse_duration(&self.log_interval)
            .with_context(|| format!("Invalid log-interval '{}'", self.log_interval))?;
        config.user_pool = self.user_pool;
        config.tenant_pool = self.tenant_pool;
        Ok(config)
    }
}

/// Generate the stream into `sink`. Returns the number of rows written.
pub fn generate_into<W: Write>(args: &GenerateArgs, sink: W) -> anyhow::Result<u64> {
    let config = args.to_config()?;
    tracing::info!(
        "Generating {} data for {} entities from {} to {} every {:?} (seed={})",
        config.use_case,
        config.scale,
        config.start,
        config.end,
        config.interval,
        config.seed
    );

    let start = Instant::now();
    let mut generator =
        DataGenerator::new(config).context("Failed to initialise the data generator")?;
    let mut writer = InterchangeWriter::new(sink);
    let rows = generator
        .write_to(&mut writer, args.limit)
        .context("Failed to write the interchange stream")?;
    writer.into_inner().context("Failed to flush output")?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Generated {} rows in {:?} ({:.2} rows/sec), simulation reached {}",
        rows,
        elapsed,
        if elapsed.as_secs_f64() > 0.0 {
            rows as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        },
        generator.current_time()
    );
    Ok(rows)
}

/// Run the generate command.
pub fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            generate_into(&args, BufWriter::new(file))?;
        }
        None => {
            let stdout = std::io::stdout();
            generate_into(&args, BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        generate: GenerateArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        let config = cli.generate.to_config().unwrap();
        assert_eq!(config.use_case, UseCase::Devops);
        assert_eq!(config.interval, std::time::Duration::from_secs(10));
        assert_eq!((config.end - config.start).num_hours(), 24);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(TestCli::try_parse_from(["test", "--use-case", "iot"]).is_err());

        let cli = TestCli::try_parse_from(["test", "--timestamp-start", "yesterday"]).unwrap();
        assert!(cli.generate.to_config().is_err());

        let cli = TestCli::try_parse_from(["test", "--log-interval", "0s"]).unwrap();
        assert!(cli.generate.to_config().is_err());
    }

    #[test]
    fn test_generate_into_buffer() {
        let cli = TestCli::try_parse_from([
            "test",
            "--scale",
            "2",
            "--timestamp-end",
            "2016-01-01T00:00:30Z",
        ])
        .unwrap();

        let mut out = Vec::new();
        let rows = generate_into(&cli.generate, &mut out).unwrap();
        assert_eq!(rows, 6);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("tags,hostname string,"));
        assert_eq!(text.lines().filter(|l| l.starts_with("cpu,")).count(), 7);
    }
}
