//! Median imputation, derived ratios and one-hot encoding.
//!
//! Fitting and transforming are separate types: `FeatureEngineer::fit` learns
//! `FitStatistics` from the train partition only and returns a
//! `FittedFeatureEngineer`, which is the only thing that can transform rows.
//! Transforming before fitting is therefore not expressible.
//!
//! Output column order:
//!
//! 1. the eight base numeric columns (imputed)
//! 2. `rooms_per_household`, `bedrooms_per_room`, `population_per_household`
//! 3. `ocean_proximity_<LEVEL>` for every non-reference level, sorted

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CATEGORICAL_COLUMN, FeatureMatrix, NUMERIC_COLUMNS, RawRecord, RecordSet};
use crate::error::{HousingError, Result};

/// Index of each ratio operand inside `NUMERIC_COLUMNS`.
const TOTAL_ROOMS: usize = 3;
const TOTAL_BEDROOMS: usize = 4;
const POPULATION: usize = 5;
const HOUSEHOLDS: usize = 6;

/// A derived feature `numerator / denominator` over base columns.
#[derive(Debug, Clone, Copy)]
pub struct RatioSpec {
    pub name: &'static str,
    numerator: usize,
    denominator: usize,
}

impl RatioSpec {
    pub fn denominator_name(&self) -> &'static str {
        NUMERIC_COLUMNS[self.denominator]
    }
}

pub const DERIVED_RATIOS: [RatioSpec; 3] = [
    RatioSpec {
        name: "rooms_per_household",
        numerator: TOTAL_ROOMS,
        denominator: HOUSEHOLDS,
    },
    RatioSpec {
        name: "bedrooms_per_room",
        numerator: TOTAL_BEDROOMS,
        denominator: TOTAL_ROOMS,
    },
    RatioSpec {
        name: "population_per_household",
        numerator: POPULATION,
        denominator: HOUSEHOLDS,
    },
];

/// Categorical levels fixed at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// All observed levels, sorted.
    pub levels: Vec<String>,
    /// Level without an indicator column (the first sorted level).
    pub reference: String,
}

impl Vocabulary {
    fn from_levels<'a>(levels: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let levels: Vec<String> = levels
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let reference = levels.first()?.clone();
        Some(Self { levels, reference })
    }

    /// Levels that get an indicator column, in output order.
    pub fn encoded_levels(&self) -> impl Iterator<Item = &str> {
        self.levels
            .iter()
            .filter(move |l| **l != self.reference)
            .map(String::as_str)
    }

    fn indicator_index(&self, level: &str) -> Option<usize> {
        self.encoded_levels().position(|l| l == level)
    }
}

/// Everything learned from the train partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    pub numeric_columns: Vec<String>,
    pub medians: Vec<f64>,
    pub vocabulary: Vocabulary,
    /// Number of train rows the statistics were computed from.
    pub n_rows: usize,
}

/// Unfitted feature pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Learn medians and the categorical vocabulary from `train`.
    pub fn fit(&self, train: &[RawRecord]) -> Result<FittedFeatureEngineer> {
        if train.is_empty() {
            return Err(HousingError::Config(
                "Cannot fit feature statistics on an empty train partition".to_string(),
            ));
        }

        let mut medians = Vec::with_capacity(NUMERIC_COLUMNS.len());
        for (col, name) in NUMERIC_COLUMNS.iter().enumerate() {
            let observed: Vec<f64> = train.iter().filter_map(|r| r.numeric()[col]).collect();
            let m = median(observed).ok_or_else(|| {
                HousingError::schema("feature fit", *name, "has no observed values in the train partition")
            })?;
            debug!(column = *name, median = m, "fitted imputation median");
            medians.push(m);
        }

        let vocabulary = Vocabulary::from_levels(train.iter().map(|r| r.ocean_proximity.as_str()))
            .ok_or_else(|| {
                HousingError::schema("feature fit", CATEGORICAL_COLUMN, "has no levels in the train partition")
            })?;
        debug!(
            levels = ?vocabulary.levels,
            reference = %vocabulary.reference,
            "fitted categorical vocabulary"
        );

        Ok(FittedFeatureEngineer {
            stats: FitStatistics {
                numeric_columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
                medians,
                vocabulary,
                n_rows: train.len(),
            },
        })
    }
}

/// Feature pipeline with frozen `FitStatistics`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedFeatureEngineer {
    stats: FitStatistics,
}

impl FittedFeatureEngineer {
    /// Rebuild a fitted pipeline from persisted statistics.
    pub fn from_statistics(stats: FitStatistics) -> Result<Self> {
        let columns_match = stats.numeric_columns.len() == NUMERIC_COLUMNS.len()
            && stats.numeric_columns.iter().zip(NUMERIC_COLUMNS).all(|(a, b)| a == b);
        if !columns_match || stats.medians.len() != NUMERIC_COLUMNS.len() {
            return Err(HousingError::schema(
                "fit statistics",
                "numeric_columns",
                format!("expected {NUMERIC_COLUMNS:?}, found {:?}", stats.numeric_columns),
            ));
        }
        Ok(Self { stats })
    }

    pub fn statistics(&self) -> &FitStatistics {
        &self.stats
    }

    /// Output column names, identical for every partition.
    pub fn output_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        cols.extend(DERIVED_RATIOS.iter().map(|r| r.name.to_string()));
        cols.extend(
            self.stats
                .vocabulary
                .encoded_levels()
                .map(|l| format!("{CATEGORICAL_COLUMN}_{l}")),
        );
        cols
    }

    /// Transform any partition with the frozen statistics.
    ///
    /// Ratios with a zero denominator become `None` cells; unseen categories
    /// get an all-zero indicator block.
    pub fn transform(&self, rows: &RecordSet) -> FeatureMatrix {
        let columns = self.output_columns();
        let n_indicators = columns.len() - NUMERIC_COLUMNS.len() - DERIVED_RATIOS.len();

        let mut values = Vec::with_capacity(rows.len());
        let mut undefined = 0usize;
        let mut unseen = 0usize;

        for (row_id, record) in rows.row_ids.iter().zip(&rows.records) {
            let base = self.impute(record);

            let mut out: Vec<Option<f64>> = Vec::with_capacity(columns.len());
            out.extend(base.iter().copied().map(Some));

            for spec in &DERIVED_RATIOS {
                match derive_ratio(spec, &base, *row_id) {
                    Ok(v) => out.push(Some(v)),
                    Err(e) => {
                        undefined += 1;
                        debug!(error = %e, "undefined derived ratio");
                        out.push(None);
                    }
                }
            }

            let mut indicators = vec![Some(0.0); n_indicators];
            let level = record.ocean_proximity.as_str();
            if let Some(idx) = self.stats.vocabulary.indicator_index(level) {
                indicators[idx] = Some(1.0);
            } else if level != self.stats.vocabulary.reference {
                unseen += 1;
            }
            out.extend(indicators);

            values.push(out);
        }

        if undefined > 0 {
            warn!(cells = undefined, "derived ratios with a zero denominator left undefined");
        }
        if unseen > 0 {
            warn!(rows = unseen, "categories unseen at fit time encoded as all-zero indicators");
        }

        FeatureMatrix {
            columns,
            row_ids: rows.row_ids.clone(),
            values,
        }
    }

    fn impute(&self, record: &RawRecord) -> [f64; 8] {
        let mut out = [0.0; 8];
        for ((slot, value), fill) in out.iter_mut().zip(record.numeric()).zip(&self.stats.medians) {
            *slot = value.unwrap_or(*fill);
        }
        out
    }
}

/// Compute one derived ratio over imputed base values.
///
/// A zero denominator is reported as `UndefinedRatio` rather than producing an
/// infinity or NaN.
pub fn derive_ratio(spec: &RatioSpec, base: &[f64; 8], row_id: usize) -> Result<f64> {
    let den = base[spec.denominator];
    if den == 0.0 {
        return Err(HousingError::UndefinedRatio {
            ratio: spec.name,
            denominator: spec.denominator_name(),
            row_id,
        });
    }
    Ok(base[spec.numerator] / den)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 0 {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    } else {
        Some(values[n / 2])
    }
}
