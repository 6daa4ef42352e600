//! Dataset sources that do not come from disk.

pub mod synthetic;

pub use synthetic::{SyntheticOptions, generate_housing};
