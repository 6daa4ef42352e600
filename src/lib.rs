//! `housing-prep` library crate.
//!
//! The binaries (`housing-ingest`, `housing-score`) are thin wrappers around
//! this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the feature engineering can be reused by a trainer written against it

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod logging;
pub mod report;
pub mod split;
