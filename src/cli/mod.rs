//! Command-line parsing for the two entry points.
//!
//! Argument parsing is kept apart from the pipeline: the structs here are
//! converted into plain `IngestConfig` / `ScoreConfig` values before any work
//! happens.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::io::fetch::DEFAULT_HOUSING_URL;

/// Log verbosity accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "INFO")]
    Info,
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "CRITICAL")]
    Critical,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    /// `tracing` has no critical level; it shares ERROR.
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Logging options shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Log level.
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Directory for the log file (empty string disables file logging).
    #[arg(long, default_value = "logs")]
    pub log_dir: String,

    /// Do not mirror log lines to stderr.
    #[arg(long)]
    pub no_console_log: bool,
}

impl LogArgs {
    /// Where the log file goes, or `None` when file logging is off.
    pub fn file_dir(&self) -> Option<&Path> {
        (!self.log_dir.is_empty()).then(|| Path::new(&self.log_dir))
    }
}

/// Prepare train/test feature matrices and labels from the raw housing CSV.
#[derive(Debug, Clone, Parser)]
#[command(name = "housing-ingest", version, about = "Split, impute and encode the housing dataset")]
pub struct IngestArgs {
    /// Directory holding `housing/housing.csv`.
    #[arg(short = 'i', long, default_value = "datasets")]
    pub input_data_dir: PathBuf,

    /// Directory receiving the prepared artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub output_artifact_dir: PathBuf,

    /// Seed for the stratified split.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows assigned to the test partition.
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Download the dataset before ingesting (overwrites the local CSV).
    #[arg(long)]
    pub fetch: bool,

    /// Source URL used with `--fetch`.
    #[arg(long, default_value = DEFAULT_HOUSING_URL)]
    pub download_url: String,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Summarize trained-model artifacts into an error report.
#[derive(Debug, Clone, Parser)]
#[command(name = "housing-score", version, about = "Print RMSE/MAE for the trained housing models")]
pub struct ScoreArgs {
    /// Directory holding the trainer's result artifacts.
    #[arg(short = 'a', long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    #[command(flatten)]
    pub log: LogArgs,
}
