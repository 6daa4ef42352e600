//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input rows (`RawRecord`) and the stratification bucket (`IncomeCategory`)
//! - persisted partitions, feature matrices and labels
//! - trainer-produced score shapes (`LinearScores`, `TreeScore`, `CvResults`)
//! - resolved run configuration

pub mod types;

pub use types::*;
