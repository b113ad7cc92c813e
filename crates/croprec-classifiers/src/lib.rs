//! croprec-classifiers: the crop recommendation prediction pipeline.
//!
//! This crate owns the whole model lifecycle: reading the tabular crop
//! dataset, fitting the label encoder and feature scaler, training a random
//! forest over the scaled features, ranking class probabilities at inference
//! time and persisting the fitted triple as a single versioned bundle.
//!
//! The entry point for most callers is [`predictor::CropPredictor`]; the
//! service layer holds the immutable [`predictor::FittedModel`] directly.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod predictor;
pub mod preprocessing;
pub mod report;
pub mod stats;

pub use config::{ForestConfig, MaxFeatures};
pub use data_handling::{Dataset, FeatureVector, TrainingRow, FEATURE_NAMES, N_FEATURES};
pub use error::PredictorError;
pub use predictor::{CropPredictor, FittedModel, Prediction, TOP_K};
