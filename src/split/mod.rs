//! Train/test partitioning.

pub mod stratified;

pub use stratified::*;
