//! Named artifact persistence.
//!
//! Each artifact lives in `<root>/<key>.json` as a self-describing envelope:
//!
//! ```json
//! { "key": "housing_prepared", "kind": "feature_matrix",
//!   "written_at": "2026-01-01T00:00:00Z", "payload": { ... } }
//! ```
//!
//! `kind` names the payload shape so a reader can refuse a file that holds the
//! wrong kind of value. Payloads are plain JSON records/columns, so the trainer
//! and scorer can be implemented independently of this crate.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CvResults, FeatureMatrix, LabelSeries, LinearScores, RecordSet, TreeScore};
use crate::error::{HousingError, Result};
use crate::features::FitStatistics;

/// Literal artifact keys shared by the ingest pipeline, the trainer and the scorer.
pub mod keys {
    pub const STRAT_TRAIN_SET: &str = "strat_train_set";
    pub const STRAT_TEST_SET: &str = "strat_test_set";
    pub const HOUSING_LABELS: &str = "housing_labels";
    pub const HOUSING_PREPARED: &str = "housing_prepared";
    pub const Y_TEST: &str = "y_test";
    pub const X_TEST_PREPARED: &str = "X_test_prepared";
    pub const FIT_STATISTICS: &str = "fit_statistics";
    pub const LIN_REG_OP: &str = "lin_reg_op";
    pub const TREE_REG_OP: &str = "tree_reg_op";
    pub const CVRES: &str = "cvres";
    pub const NEW_CVRES: &str = "new_cvres";
}

/// A value that can be stored in an `ArtifactStore`.
pub trait Artifact: Serialize + DeserializeOwned {
    /// Payload shape written into the envelope and checked on read.
    const KIND: &'static str;
}

impl Artifact for RecordSet {
    const KIND: &'static str = "record_set";
}

impl Artifact for FeatureMatrix {
    const KIND: &'static str = "feature_matrix";
}

impl Artifact for LabelSeries {
    const KIND: &'static str = "label_series";
}

impl Artifact for FitStatistics {
    const KIND: &'static str = "fit_statistics";
}

impl Artifact for LinearScores {
    const KIND: &'static str = "linear_scores";
}

impl Artifact for TreeScore {
    const KIND: &'static str = "tree_score";
}

impl Artifact for CvResults {
    const KIND: &'static str = "cv_results";
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    key: &'a str,
    kind: &'a str,
    written_at: DateTime<Utc>,
    payload: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    kind: String,
    payload: T,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    kind: String,
}

/// Key/value store over a directory root.
///
/// Assumes a single writer per run; there is no locking.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Serialize `value` under `key`, replacing any previous value.
    pub fn write<T: Artifact>(&self, key: &str, value: &T) -> Result<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.root).map_err(|e| {
            HousingError::io(
                format!("Failed to create artifact directory '{}'", self.root.display()),
                e,
            )
        })?;

        let envelope = EnvelopeOut {
            key,
            kind: T::KIND,
            written_at: Utc::now(),
            payload: value,
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| HousingError::malformed(key, format!("could not be serialized: {e}")))?;

        // Write next to the target then rename, so a reader never sees half a file.
        let path = self.path_for(key);
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, &bytes)
            .map_err(|e| HousingError::io(format!("Failed to write artifact `{key}`"), e))?;
        fs::rename(&tmp, &path)
            .map_err(|e| HousingError::io(format!("Failed to replace artifact `{key}`"), e))?;

        debug!(key, kind = T::KIND, bytes = bytes.len(), "artifact written");
        Ok(())
    }

    /// Deserialize the value stored under `key`.
    pub fn read<T: Artifact>(&self, key: &str) -> Result<T> {
        validate_key(key)?;
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HousingError::MissingArtifact {
                    key: key.to_string(),
                    path,
                });
            }
            Err(e) => return Err(HousingError::io(format!("Failed to read artifact `{key}`"), e)),
        };

        // Check the kind first so a wrong-shape payload reports as such.
        let header: EnvelopeHeader = serde_json::from_slice(&bytes)
            .map_err(|e| HousingError::malformed(key, format!("not an artifact envelope: {e}")))?;
        if header.kind != T::KIND {
            return Err(HousingError::malformed(
                key,
                format!("expected kind `{}`, found `{}`", T::KIND, header.kind),
            ));
        }

        let envelope: EnvelopeIn<T> = serde_json::from_slice(&bytes)
            .map_err(|e| HousingError::malformed(key, format!("payload does not match `{}`: {e}", T::KIND)))?;
        debug_assert_eq!(envelope.kind, T::KIND);

        debug!(key, kind = T::KIND, "artifact read");
        Ok(envelope.payload)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }
}

/// Keys become file names; refuse anything that could escape the root.
fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(HousingError::Config(format!("Invalid artifact key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::RawRecord;

    fn sample_matrix() -> FeatureMatrix {
        FeatureMatrix {
            columns: vec!["total_rooms".to_string(), "population_per_household".to_string()],
            row_ids: vec![3, 9],
            values: vec![vec![Some(880.0), Some(2.55)], vec![Some(7099.0), None]],
        }
    }

    #[test]
    fn feature_matrix_survives_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let m = sample_matrix();
        store.write(keys::HOUSING_PREPARED, &m).unwrap();
        let back: FeatureMatrix = store.read(keys::HOUSING_PREPARED).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn labels_and_records_survive_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));
        let set = RecordSet {
            row_ids: vec![0],
            records: vec![RawRecord {
                longitude: Some(-122.23),
                latitude: Some(37.88),
                housing_median_age: Some(41.0),
                total_rooms: Some(880.0),
                total_bedrooms: None,
                population: Some(322.0),
                households: Some(126.0),
                median_income: Some(8.3252),
                median_house_value: 452600.0,
                ocean_proximity: "NEAR BAY".to_string(),
            }],
        };
        store.write(keys::STRAT_TRAIN_SET, &set).unwrap();
        store.write(keys::HOUSING_LABELS, &set.labels()).unwrap();

        let back: RecordSet = store.read(keys::STRAT_TRAIN_SET).unwrap();
        assert_eq!(back, set);
        let labels: LabelSeries = store.read(keys::HOUSING_LABELS).unwrap();
        assert_eq!(labels.values, vec![452600.0]);
    }

    #[test]
    fn write_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(keys::TREE_REG_OP, &TreeScore { rmse: 1.0 }).unwrap();
        store.write(keys::TREE_REG_OP, &TreeScore { rmse: 2.0 }).unwrap();
        let back: TreeScore = store.read(keys::TREE_REG_OP).unwrap();
        assert_eq!(back.rmse, 2.0);
    }

    #[test]
    fn absent_key_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.read::<CvResults>(keys::CVRES).unwrap_err();
        assert!(matches!(err, HousingError::MissingArtifact { ref key, .. } if key == "cvres"));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.path_for(keys::CVRES), b"\x80\x04pickle").unwrap();
        let err = store.read::<CvResults>(keys::CVRES).unwrap_err();
        assert!(matches!(err, HousingError::MalformedArtifact { .. }));
    }

    #[test]
    fn wrong_kind_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(keys::HOUSING_PREPARED, &sample_matrix()).unwrap();
        let err = store.read::<LabelSeries>(keys::HOUSING_PREPARED).unwrap_err();
        assert!(err.to_string().contains("expected kind `label_series`"));
    }

    #[test]
    fn payload_with_wrong_shape_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for(keys::LIN_REG_OP),
            br#"{"key":"lin_reg_op","kind":"linear_scores","payload":{"rmse":"high"}}"#,
        )
        .unwrap();
        let err = store.read::<LinearScores>(keys::LIN_REG_OP).unwrap_err();
        assert!(matches!(err, HousingError::MalformedArtifact { .. }));
    }

    #[test]
    fn externally_written_envelope_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for(keys::LIN_REG_OP),
            br#"{"key":"lin_reg_op","kind":"linear_scores","payload":[68628.19, 49439.89]}"#,
        )
        .unwrap();
        let scores: LinearScores = store.read(keys::LIN_REG_OP).unwrap();
        assert_eq!(scores.rmse, 68628.19);
        assert_eq!(scores.mae, 49439.89);
    }

    #[test]
    fn keys_with_path_separators_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.write("../escape", &TreeScore { rmse: 1.0 }).unwrap_err();
        assert!(matches!(err, HousingError::Config(_)));
    }

    #[test]
    fn record_missing_a_numeric_column_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for(keys::STRAT_TEST_SET),
            br#"{"key":"strat_test_set","kind":"record_set","payload":{"row_ids":[0],"records":[{"median_house_value":1.0,"ocean_proximity":"INLAND"}]}}"#,
        )
        .unwrap();
        let err = store.read::<RecordSet>(keys::STRAT_TEST_SET).unwrap_err();
        assert!(matches!(err, HousingError::MalformedArtifact { ref key, .. } if key == "strat_test_set"));
        assert!(err.to_string().contains("longitude"), "{err}");
    }

    #[test]
    fn null_numeric_cell_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for(keys::STRAT_TEST_SET),
            br#"{"key":"strat_test_set","kind":"record_set","payload":{"row_ids":[4],"records":[{"longitude":-122.0,"latitude":37.0,"housing_median_age":20.0,"total_rooms":800.0,"total_bedrooms":null,"population":300.0,"households":120.0,"median_income":3.1,"median_house_value":1.0,"ocean_proximity":"INLAND"}]}}"#,
        )
        .unwrap();
        let set: RecordSet = store.read(keys::STRAT_TEST_SET).unwrap();
        assert_eq!(set.records[0].total_bedrooms, None);
        assert_eq!(set.records[0].households, Some(120.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn arbitrary_finite_values_survive_write_then_read(
            values in prop::collection::vec(any::<f64>().prop_filter("finite", |v| v.is_finite()), 1..200),
            divisor in 1.0f64..1e6,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let store = ArtifactStore::new(dir.path());
            let ratios: Vec<f64> = values.iter().map(|v| v / divisor).collect();

            let labels = LabelSeries {
                name: "median_house_value".to_string(),
                row_ids: (0..ratios.len()).collect(),
                values: ratios.clone(),
            };
            store.write(keys::Y_TEST, &labels).unwrap();
            let back: LabelSeries = store.read(keys::Y_TEST).unwrap();
            prop_assert_eq!(&back, &labels);

            let matrix = FeatureMatrix {
                columns: vec!["rooms_per_household".to_string()],
                row_ids: labels.row_ids.clone(),
                values: ratios.iter().map(|v| vec![Some(*v)]).collect(),
            };
            store.write(keys::X_TEST_PREPARED, &matrix).unwrap();
            let back: FeatureMatrix = store.read(keys::X_TEST_PREPARED).unwrap();
            prop_assert_eq!(back, matrix);
        }
    }
}
