//! Shared domain types.
//!
//! These types are intentionally kept plain and serializable so they can be:
//!
//! - threaded in-memory through split / fit / transform
//! - persisted as self-describing JSON artifacts
//! - reloaded by an independent process (trainer, scorer)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Label column (never a feature).
pub const LABEL_COLUMN: &str = "median_house_value";

/// Categorical column (one-hot encoded).
pub const CATEGORICAL_COLUMN: &str = "ocean_proximity";

/// Base numeric feature columns, in output order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
];

/// One housing-block observation.
///
/// Numeric features are optional because any of them may be blank in the
/// source table; median imputation fills them during transform. The label is
/// always required. Every numeric key must be present when deserializing;
/// `null` marks a blank cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "Option::deserialize")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub housing_median_age: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub total_rooms: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub total_bedrooms: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub population: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub households: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub median_income: Option<f64>,
    pub median_house_value: f64,
    pub ocean_proximity: String,
}

impl RawRecord {
    /// Numeric features in `NUMERIC_COLUMNS` order.
    pub fn numeric(&self) -> [Option<f64>; 8] {
        [
            self.longitude,
            self.latitude,
            self.housing_median_age,
            self.total_rooms,
            self.total_bedrooms,
            self.population,
            self.households,
            self.median_income,
        ]
    }
}

/// Income bucket used only for stratification.
///
/// Bins are right-inclusive: `(0, 1.5] (1.5, 3] (3, 4.5] (4.5, 6] (6, inf)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeCategory {
    C1,
    C2,
    C3,
    C4,
    C5,
}

impl IncomeCategory {
    pub const ALL: [IncomeCategory; 5] = [
        IncomeCategory::C1,
        IncomeCategory::C2,
        IncomeCategory::C3,
        IncomeCategory::C4,
        IncomeCategory::C5,
    ];

    /// Bin edges shared by all categories; the last bin is open-ended.
    pub const EDGES: [f64; 5] = [0.0, 1.5, 3.0, 4.5, 6.0];

    /// Bucket a median income. Non-positive and NaN incomes have no bucket.
    pub fn from_income(income: f64) -> Option<Self> {
        if !(income > 0.0) {
            return None;
        }
        let cat = if income <= 1.5 {
            IncomeCategory::C1
        } else if income <= 3.0 {
            IncomeCategory::C2
        } else if income <= 4.5 {
            IncomeCategory::C3
        } else if income <= 6.0 {
            IncomeCategory::C4
        } else {
            IncomeCategory::C5
        };
        Some(cat)
    }

    pub fn label(self) -> u8 {
        match self {
            IncomeCategory::C1 => 1,
            IncomeCategory::C2 => 2,
            IncomeCategory::C3 => 3,
            IncomeCategory::C4 => 4,
            IncomeCategory::C5 => 5,
        }
    }

    pub fn index(self) -> usize {
        self.label() as usize - 1
    }
}

/// A subset of the source dataset, keyed by original row position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub row_ids: Vec<usize>,
    pub records: Vec<RawRecord>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labels of this set, aligned with `row_ids`.
    pub fn labels(&self) -> LabelSeries {
        LabelSeries {
            name: LABEL_COLUMN.to_string(),
            row_ids: self.row_ids.clone(),
            values: self.records.iter().map(|r| r.median_house_value).collect(),
        }
    }
}

/// Model-ready numeric feature matrix.
///
/// A `None` cell marks a derived ratio whose denominator was zero. It is kept
/// explicit (JSON `null`) so consumers can detect it instead of reading an
/// infinity or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub row_ids: Vec<usize>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Location of an undefined cell in a `FeatureMatrix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedCell {
    pub row_id: usize,
    pub column: String,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.values.iter().map(|row| row.get(idx).copied().flatten()).collect())
    }

    pub fn undefined_cells(&self) -> Vec<UndefinedCell> {
        let mut out = Vec::new();
        for (row_id, row) in self.row_ids.iter().zip(&self.values) {
            for (col, cell) in self.columns.iter().zip(row) {
                if cell.is_none() {
                    out.push(UndefinedCell {
                        row_id: *row_id,
                        column: col.clone(),
                    });
                }
            }
        }
        out
    }
}

/// Label vector aligned with a feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSeries {
    pub name: String,
    pub row_ids: Vec<usize>,
    pub values: Vec<f64>,
}

/// Linear model scores as written by the trainer.
///
/// Deserializes from either `{"rmse": .., "mae": ..}` or the positional pair
/// `[rmse, mae]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScores {
    pub rmse: f64,
    pub mae: f64,
}

/// Decision tree RMSE as written by the trainer (a bare number).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeScore {
    pub rmse: f64,
}

/// Hyperparameter combination of one cross-validation candidate.
pub type HyperParams = serde_json::Map<String, serde_json::Value>;

/// Cross-validation results, column-oriented like the trainer emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResults {
    pub mean_test_score: Vec<f64>,
    pub params: Vec<HyperParams>,
}

/// Resolved configuration for one ingest run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub input_data_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub seed: u64,
    pub test_size: f64,
    pub fetch: bool,
    pub download_url: String,
}

impl IngestConfig {
    /// Location of the raw CSV inside the input directory.
    pub fn csv_path(&self) -> PathBuf {
        self.input_data_dir.join("housing").join("housing.csv")
    }
}

/// Resolved configuration for one score run.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub artifact_dir: PathBuf,
}
