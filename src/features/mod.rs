//! Feature engineering.
//!
//! Responsibilities:
//!
//! - learn imputation medians and the categorical vocabulary from train rows
//! - impute, derive ratios and one-hot encode any partition with those statistics
//! - summarize attribute correlation with the label

pub mod correlation;
pub mod engineer;

pub use correlation::*;
pub use engineer::*;
