//! Ingest and score workflows shared by the binaries and tests.
//!
//! Ingest runs:
//! (fetch) -> load CSV -> stratified split -> fit on train -> transform both
//! partitions -> persist artifacts
//!
//! Every step receives its inputs explicitly through `PipelineContext`; no
//! stage reads another stage's state behind its back.

use tracing::{debug, info, warn};

use crate::domain::{FeatureMatrix, IngestConfig, RawRecord, RecordSet, ScoreConfig};
use crate::error::Result;
use crate::features::{FeatureEngineer, FittedFeatureEngineer, LabelCorrelation, label_correlations};
use crate::io::artifacts::{ArtifactStore, keys};
use crate::report::{ModelScoreReport, ScoreAggregator};
use crate::split::{StratifiedSplit, StratifiedSplitter};

/// Inputs of one ingest run after the dataset has been loaded.
pub struct PipelineContext<'a> {
    pub config: &'a IngestConfig,
    pub store: &'a ArtifactStore,
    pub records: Vec<RawRecord>,
}

/// Everything an ingest run computed, for the summary report.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub n_rows: usize,
    pub split: StratifiedSplit,
    pub correlations: Vec<LabelCorrelation>,
    pub fitted: FittedFeatureEngineer,
    pub train_undefined: usize,
    pub test_undefined: usize,
    pub artifacts: Vec<&'static str>,
}

/// Run the full ingest workflow described by `config`.
pub fn run_ingest(config: &IngestConfig) -> Result<IngestOutput> {
    let csv_path = config.csv_path();
    if config.fetch {
        info!(url = %config.download_url, dest = %csv_path.display(), "downloading housing dataset");
        crate::io::fetch_housing_csv(&config.download_url, &csv_path)?;
    }

    let records = crate::io::load_housing_csv(&csv_path)?;
    let store = ArtifactStore::new(&config.artifact_dir);
    prepare(PipelineContext {
        config,
        store: &store,
        records,
    })
}

/// Split, engineer and persist an already-loaded dataset.
pub fn prepare(ctx: PipelineContext<'_>) -> Result<IngestOutput> {
    let PipelineContext { config, store, records } = ctx;
    let n_rows = records.len();

    let splitter = StratifiedSplitter::new(config.test_size, config.seed);
    let split = splitter.split(&records)?;
    info!(
        train = split.partition.train.len(),
        test = split.partition.test.len(),
        max_strat_dev = split.max_stratified_deviation(),
        max_random_dev = split.max_random_deviation(),
        "stratified split complete"
    );

    let train_set = subset(&records, &split.partition.train);
    let test_set = subset(&records, &split.partition.test);
    drop(records);

    let correlations = label_correlations(&train_set.records);
    for c in &correlations {
        debug!(column = c.column, r = c.r, "label correlation");
    }

    let fitted = FeatureEngineer::new().fit(&train_set.records)?;
    let housing_prepared = fitted.transform(&train_set);
    let x_test_prepared = fitted.transform(&test_set);
    let train_undefined = log_undefined("train", &housing_prepared);
    let test_undefined = log_undefined("test", &x_test_prepared);

    store.write(keys::STRAT_TRAIN_SET, &train_set)?;
    store.write(keys::STRAT_TEST_SET, &test_set)?;
    store.write(keys::HOUSING_LABELS, &train_set.labels())?;
    store.write(keys::Y_TEST, &test_set.labels())?;
    store.write(keys::FIT_STATISTICS, fitted.statistics())?;
    store.write(keys::HOUSING_PREPARED, &housing_prepared)?;
    store.write(keys::X_TEST_PREPARED, &x_test_prepared)?;

    let artifacts = vec![
        keys::STRAT_TRAIN_SET,
        keys::STRAT_TEST_SET,
        keys::HOUSING_LABELS,
        keys::Y_TEST,
        keys::FIT_STATISTICS,
        keys::HOUSING_PREPARED,
        keys::X_TEST_PREPARED,
    ];
    info!(dir = %store.root().display(), count = artifacts.len(), "artifacts written");

    Ok(IngestOutput {
        n_rows,
        split,
        correlations,
        fitted,
        train_undefined,
        test_undefined,
        artifacts,
    })
}

/// Read the trainer's outputs and convert them into a score report.
pub fn run_score(config: &ScoreConfig) -> Result<ModelScoreReport> {
    let store = ArtifactStore::new(&config.artifact_dir);
    ScoreAggregator::new(&store).aggregate()
}

fn subset(records: &[RawRecord], indices: &[usize]) -> RecordSet {
    RecordSet {
        row_ids: indices.to_vec(),
        records: indices.iter().map(|&i| records[i].clone()).collect(),
    }
}

fn log_undefined(partition: &str, matrix: &FeatureMatrix) -> usize {
    let cells = matrix.undefined_cells();
    for cell in cells.iter().take(10) {
        warn!(partition, row_id = cell.row_id, column = %cell.column, "undefined derived ratio");
    }
    if cells.len() > 10 {
        warn!(partition, remaining = cells.len() - 10, "further undefined ratio cells not listed");
    }
    cells.len()
}
