use std::path::PathBuf;

use thiserror::Error;

/// Every failure the ingest and score pipelines can surface.
///
/// Each variant carries the operation, key or column involved so a log line is
/// enough to diagnose the failure without re-running.
#[derive(Debug, Error)]
pub enum HousingError {
    #[error("Schema mismatch in {context}: column `{column}` {detail}")]
    SchemaMismatch {
        context: String,
        column: String,
        detail: String,
    },

    #[error("Artifact `{key}` not found at '{}'", path.display())]
    MissingArtifact { key: String, path: PathBuf },

    #[error("Artifact `{key}` is malformed: {detail}")]
    MalformedArtifact { key: String, detail: String },

    #[error("Cannot stratify: {0}")]
    Stratification(String),

    #[error("Undefined ratio `{ratio}` for row {row_id}: denominator `{denominator}` is zero")]
    UndefinedRatio {
        ratio: &'static str,
        denominator: &'static str,
        row_id: usize,
    },

    #[error("Failed to fetch dataset from {url}: {detail}")]
    RemoteFetch { url: String, detail: String },

    #[error("Data integrity error in `{key}`: {detail}")]
    DataIntegrity { key: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl HousingError {
    pub fn schema(context: impl Into<String>, column: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            context: context.into(),
            column: column.into(),
            detail: detail.into(),
        }
    }

    pub fn malformed(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            key: key.into(),
            detail: detail.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::SchemaMismatch { .. } | Self::Io { .. } => 2,
            Self::MissingArtifact { .. } | Self::MalformedArtifact { .. } => 3,
            Self::Stratification(_) | Self::UndefinedRatio { .. } | Self::DataIntegrity { .. } => 4,
            Self::RemoteFetch { .. } => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, HousingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_names_key_and_path() {
        let err = HousingError::MissingArtifact {
            key: "cvres".to_string(),
            path: PathBuf::from("artifacts/cvres.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("`cvres`"));
        assert!(msg.contains("artifacts/cvres.json"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exit_codes_are_non_zero() {
        let errors = [
            HousingError::schema("csv", "households", "is missing"),
            HousingError::malformed("lin_reg_op", "bad json"),
            HousingError::Stratification("empty bin".to_string()),
            HousingError::UndefinedRatio {
                ratio: "population_per_household",
                denominator: "households",
                row_id: 7,
            },
            HousingError::RemoteFetch {
                url: "http://localhost".to_string(),
                detail: "refused".to_string(),
            },
            HousingError::Config("bad".to_string()),
        ];
        for err in errors {
            assert_ne!(err.exit_code(), 0, "{err}");
        }
    }
}
