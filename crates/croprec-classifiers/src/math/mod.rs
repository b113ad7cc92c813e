//! Small row-major matrix type used for feature tables and probability grids.
//!
//! Kept dependency-free: the pipeline only needs row access, row selection
//! and column statistics, so a full ndarray stack is not pulled in.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
