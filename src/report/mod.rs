//! Score aggregation: trainer outputs -> comparable error metrics.

use tracing::info;

use crate::domain::{CvResults, HyperParams, LinearScores, TreeScore};
use crate::error::{HousingError, Result};
use crate::io::artifacts::{ArtifactStore, keys};

pub mod format;

pub use format::*;

/// One cross-validation candidate converted to RMSE.
#[derive(Debug, Clone, PartialEq)]
pub struct CvEntry {
    pub rmse: f64,
    pub params: HyperParams,
}

/// A cross-validation result set in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct CvSection {
    pub key: &'static str,
    pub title: &'static str,
    pub entries: Vec<CvEntry>,
}

/// Consolidated error report across all trained models.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScoreReport {
    pub linear: LinearScores,
    pub tree: TreeScore,
    pub cv_sections: Vec<CvSection>,
}

/// Reads the trainer's result artifacts and builds a `ModelScoreReport`.
pub struct ScoreAggregator<'a> {
    store: &'a ArtifactStore,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    pub fn aggregate(&self) -> Result<ModelScoreReport> {
        let linear: LinearScores = self.store.read(keys::LIN_REG_OP)?;
        let tree: TreeScore = self.store.read(keys::TREE_REG_OP)?;

        let mut cv_sections = Vec::with_capacity(2);
        for (key, title) in [
            (keys::CVRES, "Random forest regression RMSE"),
            (keys::NEW_CVRES, "Modified random forest regression RMSE"),
        ] {
            let results: CvResults = self.store.read(key)?;
            let entries = cv_rmse(key, &results)?;
            info!(key, candidates = entries.len(), "cross-validation results converted");
            cv_sections.push(CvSection { key, title, entries });
        }

        Ok(ModelScoreReport {
            linear,
            tree,
            cv_sections,
        })
    }
}

/// Convert mean negative-squared-error scores to RMSE, keeping stored order.
///
/// A score that is not strictly negative has no real square root and is
/// reported as a data-integrity error.
pub fn cv_rmse(key: &str, results: &CvResults) -> Result<Vec<CvEntry>> {
    if results.mean_test_score.len() != results.params.len() {
        return Err(HousingError::malformed(
            key,
            format!(
                "{} scores but {} parameter combinations",
                results.mean_test_score.len(),
                results.params.len()
            ),
        ));
    }

    results
        .mean_test_score
        .iter()
        .zip(&results.params)
        .enumerate()
        .map(|(i, (&score, params))| {
            if !(score < 0.0) {
                return Err(HousingError::DataIntegrity {
                    key: key.to_string(),
                    detail: format!("mean_test_score[{i}] = {score} is not negative; RMSE is undefined"),
                });
            }
            Ok(CvEntry {
                rmse: (-score).sqrt(),
                params: params.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(v: serde_json::Value) -> HyperParams {
        v.as_object().cloned().unwrap()
    }

    fn cv(scores: &[f64]) -> CvResults {
        CvResults {
            mean_test_score: scores.to_vec(),
            params: (0..scores.len())
                .map(|i| params(json!({"n_estimators": i * 10, "max_features": 2})))
                .collect(),
        }
    }

    fn write_all(store: &ArtifactStore, cvres: &CvResults, new_cvres: &CvResults) {
        store
            .write(keys::LIN_REG_OP, &LinearScores { rmse: 68628.19, mae: 49439.89 })
            .unwrap();
        store.write(keys::TREE_REG_OP, &TreeScore { rmse: 0.0 }).unwrap();
        store.write(keys::CVRES, cvres).unwrap();
        store.write(keys::NEW_CVRES, new_cvres).unwrap();
    }

    #[test]
    fn negative_quarter_becomes_half() {
        let entries = cv_rmse("cvres", &cv(&[-0.25])).unwrap();
        assert_eq!(entries[0].rmse, 0.5);
    }

    #[test]
    fn stored_order_is_preserved() {
        let entries = cv_rmse("cvres", &cv(&[-4.0, -0.25, -9.0, -0.25])).unwrap();
        let rmse: Vec<f64> = entries.iter().map(|e| e.rmse).collect();
        assert_eq!(rmse, vec![2.0, 0.5, 3.0, 0.5]);
        let n_est: Vec<u64> = entries
            .iter()
            .map(|e| e.params["n_estimators"].as_u64().unwrap())
            .collect();
        assert_eq!(n_est, vec![0, 10, 20, 30]);
    }

    #[test]
    fn non_negative_score_is_integrity_error() {
        for bad in [0.0, 0.25, f64::NAN] {
            let err = cv_rmse("new_cvres", &cv(&[-1.0, bad])).unwrap_err();
            match &err {
                HousingError::DataIntegrity { key, detail } => {
                    assert_eq!(key, "new_cvres");
                    assert!(detail.contains("mean_test_score[1]"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let mut results = cv(&[-1.0, -2.0]);
        results.params.pop();
        let err = cv_rmse("cvres", &results).unwrap_err();
        assert!(matches!(err, HousingError::MalformedArtifact { .. }));
    }

    #[test]
    fn aggregate_reads_all_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        write_all(&store, &cv(&[-0.25, -1.0]), &cv(&[-16.0]));

        let report = ScoreAggregator::new(&store).aggregate().unwrap();
        assert_eq!(report.linear.mae, 49439.89);
        assert_eq!(report.linear.rmse, 68628.19);
        assert_eq!(report.tree.rmse, 0.0);
        assert_eq!(report.cv_sections.len(), 2);
        assert_eq!(report.cv_sections[0].key, "cvres");
        assert_eq!(report.cv_sections[0].entries[1].rmse, 1.0);
        assert_eq!(report.cv_sections[1].entries[0].rmse, 4.0);
    }

    #[test]
    fn missing_artifact_aborts_with_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        write_all(&store, &cv(&[-1.0]), &cv(&[-1.0]));
        std::fs::remove_file(store.path_for(keys::NEW_CVRES)).unwrap();

        let err = ScoreAggregator::new(&store).aggregate().unwrap_err();
        assert!(matches!(err, HousingError::MissingArtifact { ref key, .. } if key == "new_cvres"));
    }

    #[test]
    fn malformed_artifact_aborts_with_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        write_all(&store, &cv(&[-1.0]), &cv(&[-1.0]));
        std::fs::write(store.path_for(keys::TREE_REG_OP), "not json").unwrap();

        let err = ScoreAggregator::new(&store).aggregate().unwrap_err();
        assert!(matches!(err, HousingError::MalformedArtifact { ref key, .. } if key == "tree_reg_op"));
    }
}
