//! Top-level application orchestration.
//!
//! The binaries in `src/bin/` are intentionally tiny; this module is the "real
//! main" for each of them:
//! - parses CLI arguments
//! - sets up logging
//! - runs the ingest or score pipeline
//! - prints the report

use clap::Parser;
use tracing::{error, info};

use crate::cli::{IngestArgs, ScoreArgs};
use crate::domain::{IngestConfig, ScoreConfig};
use crate::error::HousingError;
use crate::logging::init_logging;

pub mod pipeline;

/// Entry point for the `housing-ingest` binary.
pub fn run_ingest() -> Result<(), HousingError> {
    let args = IngestArgs::parse();
    init_logging(&args.log, "ingest.log")?;

    let config = ingest_config_from_args(&args);
    info!(csv = %config.csv_path().display(), artifacts = %config.artifact_dir.display(), "starting ingest");

    let run = pipeline::run_ingest(&config).inspect_err(|e| error!(error = %e, "ingest failed"))?;
    println!("{}", crate::report::format_ingest_summary(&run));
    info!("ingest finished");
    Ok(())
}

/// Entry point for the `housing-score` binary.
pub fn run_score() -> Result<(), HousingError> {
    let args = ScoreArgs::parse();
    init_logging(&args.log, "score.log")?;

    let config = score_config_from_args(&args);
    info!(artifacts = %config.artifact_dir.display(), "starting score aggregation");

    let report = pipeline::run_score(&config).inspect_err(|e| error!(error = %e, "scoring failed"))?;
    println!("{}", crate::report::format_score_report(&report));
    info!("score aggregation finished");
    Ok(())
}

pub fn ingest_config_from_args(args: &IngestArgs) -> IngestConfig {
    IngestConfig {
        input_data_dir: args.input_data_dir.clone(),
        artifact_dir: args.output_artifact_dir.clone(),
        seed: args.seed,
        test_size: args.test_size,
        fetch: args.fetch,
        download_url: args.download_url.clone(),
    }
}

pub fn score_config_from_args(args: &ScoreArgs) -> ScoreConfig {
    ScoreConfig {
        artifact_dir: args.artifact_dir.clone(),
    }
}
