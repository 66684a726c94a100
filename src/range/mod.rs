//! Range filter implementations for sketch_oxide
//!
//! Provides efficient range query support for LSM-tree style databases.

mod grafite;

pub use grafite::GrafiteFilter;
