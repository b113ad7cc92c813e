use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PredictorError;

/// Number of candidate features considered at each split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
    All,
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(n) => *n,
        };
        n.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "all" => Ok(MaxFeatures::All),
            other => other
                .parse::<usize>()
                .map(MaxFeatures::Fixed)
                .map_err(|_| {
                    format!(
                        "Unknown max_features value: {}. Expected 'sqrt', 'all' or a positive integer",
                        s
                    )
                }),
        }
    }
}

/// Hyper-parameters of the random forest and of the train/test protocol.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    /// Seed for bootstrap sampling and feature sub-sampling.
    pub forest_seed: u64,
    /// Seed for the train/held-out partition.
    pub split_seed: u64,
    pub test_fraction: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            forest_seed: 42,
            split_seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), PredictorError> {
        if self.n_trees == 0 {
            return Err(PredictorError::InvalidConfig(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(PredictorError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(PredictorError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if let MaxFeatures::Fixed(0) = self.max_features {
            return Err(PredictorError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "test_fraction must lie strictly between 0 and 1, got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}
