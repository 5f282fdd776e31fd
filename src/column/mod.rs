//! Path and column model.
//!
//! A [`Path`] is a named stop sequence; a [`Column`] is a path priced for the
//! master problem (cost and customer coverage). The [`ColumnPool`] collects
//! columns across iterations of one run.

pub mod path;
mod pool;

pub use path::{cost, covers, seed_paths, Path};
pub use pool::{Column, ColumnId, ColumnPool};
