//! croprec-cli: training, batch inference and the HTTP prediction service
//! built on `croprec-classifiers`.
pub mod predict;
pub mod serve;
pub mod train;
pub mod util;
