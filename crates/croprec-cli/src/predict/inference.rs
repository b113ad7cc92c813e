use anyhow::{Context, Result};

use croprec_classifiers::io::read_feature_vectors;
use croprec_classifiers::{FeatureVector, FittedModel, Prediction};

use super::input::{PredictConfig, PredictInput};
use super::output::write_prediction_table;
use crate::serve::schema::PredictResponse;

pub fn run_inference(config: &PredictConfig) -> Result<()> {
    let model = FittedModel::load(&config.model_path)
        .with_context(|| format!("Failed to load model from {}", config.model_path.display()))?;
    log::info!(
        "Loaded model with {} crops from {}",
        model.classes().len(),
        config.model_path.display()
    );

    match &config.input {
        PredictInput::Single(features) => {
            let prediction = model.predict(features)?;
            let response = PredictResponse::from(prediction);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        PredictInput::Batch {
            inference_data,
            output_file,
        } => {
            let vectors = read_feature_vectors(inference_data).with_context(|| {
                format!("Failed to load inference data: {}", inference_data.display())
            })?;
            log::info!("Scoring {} rows from {}", vectors.len(), inference_data.display());

            let mut rows: Vec<(FeatureVector, Prediction)> = Vec::with_capacity(vectors.len());
            for features in vectors {
                let prediction = model.predict(&features)?;
                rows.push((features, prediction));
            }
            write_prediction_table(&rows, output_file.as_deref())?;
            if let Some(path) = output_file {
                log::info!("Predictions written to {}", path.display());
            }
        }
    }
    Ok(())
}
