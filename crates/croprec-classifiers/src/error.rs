use std::path::PathBuf;

use thiserror::Error;

use crate::math::ShapeError;

/// Errors raised by the prediction pipeline.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// predict/save was called before train() or load_model().
    #[error("untrained model: call train() or load_model() first")]
    Untrained,

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("model file missing or corrupt: {}: {reason}", path.display())]
    ModelFile { path: PathBuf, reason: String },

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("label '{0}' is not known to the label encoder")]
    UnknownLabel(String),

    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PredictorError {
    pub(crate) fn model_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PredictorError::ModelFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
