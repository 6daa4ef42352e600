//! Input/output helpers.
//!
//! - CSV ingest + schema validation (`ingest`)
//! - named artifact persistence (`artifacts`)
//! - raw dataset download (`fetch`)

pub mod artifacts;
pub mod fetch;
pub mod ingest;

pub use artifacts::{Artifact, ArtifactStore, keys};
pub use fetch::*;
pub use ingest::*;
