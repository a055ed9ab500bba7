//! CLI: orders as JSON (stdin or --input) -> stdout JSON.
//!
//! Usage:
//!   cat orders.json | sales-anomaly detect --contamination 0.05
//!   sales-anomaly --input orders.json features
use clap::{Args, Parser, Subcommand};
use sales_anomaly::{
    build_features, fit_and_score, AnomalyResult, AnomalySummary, CategoryEncoder, Dataset,
    DetectorConfig, JsonSource, FEATURE_COLUMNS,
};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sales-anomaly")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flag unusual sales orders with an isolation forest")]
struct Cli {
    /// JSON file with orders; stdin when omitted.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit on the batch, score every order and summarize.
    Detect(DetectArgs),
    /// Print the engineered feature matrix.
    Features,
}

#[derive(Debug, Args)]
struct DetectArgs {
    #[arg(long, default_value_t = DetectorConfig::default().contamination)]
    contamination: f64,
    #[arg(long, default_value_t = DetectorConfig::default().n_estimators)]
    n_estimators: usize,
    #[arg(long, default_value_t = DetectorConfig::default().max_samples)]
    max_samples: usize,
    #[arg(long, default_value_t = DetectorConfig::default().random_seed)]
    seed: u64,
}

impl From<DetectorConfig> for DetectArgs {
    fn from(config: DetectorConfig) -> Self {
        Self {
            contamination: config.contamination,
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            seed: config.random_seed,
        }
    }
}

impl DetectArgs {
    fn config(&self) -> DetectorConfig {
        DetectorConfig::default()
            .with_contamination(self.contamination)
            .with_n_estimators(self.n_estimators)
            .with_max_samples(self.max_samples)
            .with_seed(self.seed)
    }
}

// --- Output structs ---

#[derive(Debug, Serialize)]
struct DetectOutput {
    results: Vec<AnomalyResult>,
    summary: AnomalySummary,
}

#[derive(Debug, Serialize)]
struct FeaturesOutput {
    columns: Vec<&'static str>,
    rows: Vec<Vec<f64>>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_anomaly=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let source = match &cli.input {
        Some(path) => JsonSource::from_path(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            JsonSource::from_text(text)
        }
    };
    let dataset = Dataset::load(&source)?;

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Detect(DetectorConfig::default().into()));

    match command {
        Commands::Detect(args) => {
            let (results, summary) = fit_and_score(dataset.records(), args.config())?;
            write_json(&DetectOutput { results, summary }, cli.pretty)?;
        }
        Commands::Features => {
            let encoder = CategoryEncoder::fit(dataset.records());
            let x = build_features(dataset.records(), &encoder)?;
            let rows = x.rows().into_iter().map(|row| row.to_vec()).collect();
            write_json(
                &FeaturesOutput {
                    columns: FEATURE_COLUMNS.to_vec(),
                    rows,
                },
                cli.pretty,
            )?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_config(argv: &[&str]) -> DetectorConfig {
        let cli = Cli::parse_from(argv);
        match cli
            .command
            .unwrap_or_else(|| Commands::Detect(DetectorConfig::default().into()))
        {
            Commands::Detect(args) => args.config(),
            Commands::Features => panic!("expected detect"),
        }
    }

    #[test]
    fn test_default_command_matches_config_defaults() {
        assert_eq!(detect_config(&["sales-anomaly"]), DetectorConfig::default());
        assert_eq!(detect_config(&["sales-anomaly", "detect"]), DetectorConfig::default());
    }

    #[test]
    fn test_detect_flags_override_defaults() {
        let config = detect_config(&["sales-anomaly", "detect", "--contamination", "0.05", "--seed", "7"]);
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.n_estimators, DetectorConfig::default().n_estimators);
    }
}
