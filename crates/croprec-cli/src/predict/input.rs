use anyhow::{bail, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use croprec_classifiers::{FeatureVector, FEATURE_NAMES, N_FEATURES};

use crate::util::validate_tsv_or_csv_file;

/// What to score: one vector from the command line or a whole table.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictInput {
    Single(FeatureVector),
    Batch {
        inference_data: PathBuf,
        /// Written to stdout when unset.
        output_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictConfig {
    pub model_path: PathBuf,
    pub input: PredictInput,
}

impl PredictConfig {
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let model_path = matches
            .get_one::<PathBuf>("model_path")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("crop_predictor_model.bin"));

        let input = match matches.get_one::<PathBuf>("inference_data") {
            Some(path) => {
                validate_tsv_or_csv_file(&path.to_string_lossy())?;
                PredictInput::Batch {
                    inference_data: path.clone(),
                    output_file: matches.get_one::<PathBuf>("output_file").cloned(),
                }
            }
            None => PredictInput::Single(features_from_flags(matches)?),
        };

        Ok(PredictConfig { model_path, input })
    }
}

/// Collect the seven feature flags, whose argument ids are the feature names.
fn features_from_flags(matches: &ArgMatches) -> Result<FeatureVector> {
    let mut values = [0.0f64; N_FEATURES];
    let mut missing = Vec::new();
    for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
        match matches.get_one::<f64>(name) {
            Some(v) => *slot = *v,
            None => missing.push(format!("--{}", name)),
        }
    }
    if !missing.is_empty() {
        bail!(
            "Missing feature values {}; pass all seven or use --inference_data",
            missing.join(", ")
        );
    }
    Ok(FeatureVector::from_array(values))
}
