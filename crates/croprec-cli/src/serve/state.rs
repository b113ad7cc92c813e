//! Shared service state.
use std::sync::Arc;

use croprec_classifiers::{CropPredictor, FittedModel};

/// Read-only context injected into every handler.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    model: Option<Arc<FittedModel>>,
}

impl AppState {
    pub fn new(model: Option<Arc<FittedModel>>) -> Self {
        AppState { model }
    }

    pub fn from_predictor(predictor: &CropPredictor) -> Self {
        AppState::new(predictor.model())
    }

    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_deref()
    }
}
